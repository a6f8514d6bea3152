// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, warn, Instrument, Level};

use crate::clip::ClipId;
use crate::player::Player;
use crate::sequencer::{Sequence, Sequencer};
use crate::vocabulary::Vocabulary;

pub mod keyboard;

/// Controller events that will trigger behavior in the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Plays the given clip, replacing whatever is playing.
    Play(ClipId),

    /// Restarts the current clip from the beginning.
    Replay,

    /// Stops the current clip and any running sequence.
    Stop,

    /// Plays every clip of the named vocabulary category in order.
    Sequence(String),
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Drives a player from a stream of events.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(
        player: Arc<Player>,
        vocabulary: Arc<Vocabulary>,
        sequence_delay: Duration,
        driver: Arc<dyn Driver>,
    ) -> Controller {
        let span = span!(Level::INFO, "controller");
        Controller {
            handle: tokio::spawn(
                Controller::trigger_events(player, vocabulary, sequence_delay, driver)
                    .instrument(span),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Triggers player events by watching the driver and getting events from it.
    async fn trigger_events(
        player: Arc<Player>,
        vocabulary: Arc<Vocabulary>,
        sequence_delay: Duration,
        driver: Arc<dyn Driver>,
    ) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);
        let sequencer = Sequencer::new(player.clone());
        let mut sequence: Option<Sequence> = None;

        info!(
            categories = vocabulary.categories().len(),
            "Controller started."
        );

        while let Some(event) = events_rx.recv().await {
            info!(event = format!("{:?}", event), "Received event.");

            match event {
                Event::Play(id) => {
                    Self::cancel_sequence(&mut sequence);
                    let _ = player.play(&id);
                }
                Event::Replay => {
                    if player.replay().is_none() {
                        info!("Nothing to replay.");
                    }
                }
                Event::Stop => {
                    Self::cancel_sequence(&mut sequence);
                    player.stop();
                }
                Event::Sequence(name) => match vocabulary.category(&name) {
                    Some(items) => {
                        Self::cancel_sequence(&mut sequence);
                        let ids = items.iter().map(|item| item.clip().clone()).collect();
                        sequence = Some(sequencer.play_sequence(ids, sequence_delay));
                    }
                    None => warn!(category = name, "Unknown vocabulary category"),
                },
            }
        }

        info!("Controller closing.");
        Self::cancel_sequence(&mut sequence);
        match join_handle.await {
            Ok(Err(e)) => error!("Event monitor failed: {}", e),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
            Ok(Ok(())) => {}
        }
    }

    fn cancel_sequence(sequence: &mut Option<Sequence>) {
        if let Some(sequence) = sequence.take() {
            sequence.cancel();
        }
    }
}
