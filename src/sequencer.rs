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

//! Plays a list of clips one after another with a pause between them.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, span, Instrument, Level};

use crate::{
    cache::RunStatus,
    clip::ClipId,
    player::{Outcome, Player},
};

/// The default pause between clips.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Extra time given to an item with no end to wait for, such as a spoken clip.
pub const FALLBACK_ALLOWANCE: Duration = Duration::from_millis(1000);

/// Schedules sequences of clips on a player.
pub struct Sequencer {
    player: Arc<Player>,
}

impl Sequencer {
    pub fn new(player: Arc<Player>) -> Sequencer {
        Sequencer { player }
    }

    /// Plays the clips in order. Each clip starts only after the previous one ended and the
    /// delay passed. A clip that had to be spoken is given the delay plus an allowance
    /// instead. An empty list does nothing.
    pub fn play_sequence(&self, ids: Vec<ClipId>, delay: Duration) -> Sequence {
        let player = self.player.clone();
        let span = span!(Level::INFO, "sequence", clips = ids.len());
        let join = tokio::spawn(
            async move {
                if ids.is_empty() {
                    debug!("Nothing to play");
                    return;
                }

                for (index, id) in ids.iter().enumerate() {
                    info!(index, clip = %id, "Playing sequence item");
                    match player.play(id).outcome().await {
                        Outcome::Playing(run) => {
                            if run.finished().await == RunStatus::Stopped {
                                debug!(clip = %id, "Sequence item was stopped");
                            }
                            tokio::time::sleep(delay).await;
                        }
                        Outcome::Fallback | Outcome::Superseded => {
                            tokio::time::sleep(delay + FALLBACK_ALLOWANCE).await
                        }
                    }
                }
                info!("Sequence finished");
            }
            .instrument(span),
        );

        Sequence {
            join,
            player: self.player.clone(),
        }
    }
}

/// A running sequence.
pub struct Sequence {
    join: JoinHandle<()>,
    player: Arc<Player>,
}

impl Sequence {
    /// Stops scheduling further clips and stops the one that's playing.
    pub fn cancel(&self) {
        if !self.join.is_finished() {
            self.join.abort();
            self.player.stop();
        }
    }

    /// Waits for the sequence to finish or be cancelled.
    pub async fn join(self) {
        if let Err(e) = self.join.await {
            if !e.is_cancelled() {
                error!(err = e.to_string(), "Sequence failed");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use super::Sequencer;
    use crate::{
        audio::mock::{ClipEvent, Device},
        clip::ClipId,
        testutil::{eventually, harness},
    };

    fn ids(names: &[&str]) -> Vec<ClipId> {
        names.iter().map(|name| ClipId::from(*name)).collect()
    }

    fn first(device: &Device, name: &str, event: ClipEvent) -> Instant {
        device
            .events_for(name)
            .into_iter()
            .find(|(e, _)| *e == event)
            .map(|(_, at)| at)
            .unwrap_or_else(|| panic!("no {:?} event for {}", event, name))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sequence_plays_in_order_with_gaps() {
        let device = Device::get("mock-device")
            .with_clip("a.mp3", Duration::from_millis(50))
            .with_clip("b.mp3", Duration::from_millis(50))
            .with_clip("c.mp3", Duration::from_millis(50));
        let h = harness(device.clone());
        let sequencer = Sequencer::new(h.player.clone());
        let delay = Duration::from_millis(200);

        sequencer
            .play_sequence(ids(&["a.mp3", "b.mp3", "c.mp3"]), delay)
            .join()
            .await;

        let started: Vec<String> = device
            .events()
            .into_iter()
            .filter(|(_, event, _)| *event == ClipEvent::Started)
            .map(|(name, _, _)| name)
            .collect();
        assert_eq!(vec!["a.mp3", "b.mp3", "c.mp3"], started);

        for (previous, next) in [("a.mp3", "b.mp3"), ("b.mp3", "c.mp3")] {
            let ended = first(&device, previous, ClipEvent::Ended);
            let started = first(&device, next, ClipEvent::Started);
            assert!(
                started.duration_since(ended) >= delay,
                "{} started too soon after {}",
                next,
                previous
            );
        }
        assert!(!h.player.is_playing());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_sequence() {
        let device = Device::get("mock-device");
        let h = harness(device.clone());
        let sequencer = Sequencer::new(h.player.clone());

        sequencer
            .play_sequence(Vec::new(), Duration::from_secs(10))
            .join()
            .await;
        assert!(device.events().is_empty());
        assert!(h.engine.spoken().is_empty());
        assert_eq!(None, h.player.current());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spoken_item_waits_longer() {
        let device = Device::get("mock-device").with_clip("b.mp3", Duration::from_millis(50));
        let h = harness(device.clone());
        let sequencer = Sequencer::new(h.player.clone());
        let delay = Duration::from_millis(100);

        let start = Instant::now();
        sequencer
            .play_sequence(ids(&["nonexistent.mp3", "b.mp3"]), delay)
            .join()
            .await;

        assert_eq!(1, h.engine.spoken().len());
        let started = first(&device, "b.mp3", ClipEvent::Started);
        assert!(started.duration_since(start) >= delay + super::FALLBACK_ALLOWANCE);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_superseded_item_waits_longer() {
        let device = Device::get("mock-device")
            .with_load_delay(Duration::from_millis(300))
            .with_clip("a.mp3", Duration::from_millis(50))
            .with_clip("b.mp3", Duration::from_millis(50));
        let h = harness(device.clone());
        let sequencer = Sequencer::new(h.player.clone());
        let delay = Duration::from_millis(100);

        let start = Instant::now();
        let sequence = sequencer.play_sequence(ids(&["a.mp3", "b.mp3"]), delay);
        // Stopping while the first clip loads means it never starts.
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.player.stop();
        sequence.join().await;

        assert!(device.events_for("a.mp3").is_empty());
        let started = first(&device, "b.mp3", ClipEvent::Started);
        assert!(started.duration_since(start) >= delay + super::FALLBACK_ALLOWANCE);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_sequence() {
        let device = Device::get("mock-device")
            .with_clip("a.mp3", Duration::from_secs(5))
            .with_clip("b.mp3", Duration::from_millis(50));
        let h = harness(device.clone());
        let sequencer = Sequencer::new(h.player.clone());

        let sequence = sequencer.play_sequence(ids(&["a.mp3", "b.mp3"]), Duration::ZERO);
        eventually(|| device.is_playing(), "First clip never started");

        sequence.cancel();
        sequence.join().await;

        eventually(
            || !device.events_for("a.mp3").is_empty() && !device.is_playing(),
            "First clip was never stopped",
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(device.events_for("b.mp3").is_empty());
    }
}
