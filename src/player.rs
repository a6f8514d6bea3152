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
use std::{path::Path, sync::Arc};

use parking_lot::Mutex;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, span, warn, Level, Span};

use crate::{
    audio,
    cache::{AudioHandle, ClipCache, LoadError, Run, RunStatus},
    clip::ClipId,
    speech::Fallback,
};

/// How many player events a slow subscriber can fall behind by.
const EVENT_CAPACITY: usize = 64;

/// Something the player did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    Started(ClipId),
    Ended(ClipId),
    Stopped(ClipId),
    Missing { id: ClipId, reason: String },
    Fallback(ClipId),
}

/// How a play request turned out.
#[derive(Debug)]
pub enum Outcome {
    /// The clip is playing. The run reports when it ends.
    Playing(Run),
    /// The clip couldn't be loaded and was spoken instead. There's no end to wait for.
    Fallback,
    /// A newer request came in while the clip was loading, so it wasn't played.
    Superseded,
}

enum Pending {
    Now(Outcome),
    Deferred(JoinHandle<Outcome>),
}

/// A receipt for a play request. Awaiting it is optional.
pub struct Playback {
    id: ClipId,
    pending: Pending,
}

impl Playback {
    pub fn id(&self) -> &ClipId {
        &self.id
    }

    /// Returns true if the clip had to be loaded before it could play.
    pub fn is_deferred(&self) -> bool {
        matches!(self.pending, Pending::Deferred(_))
    }

    /// Waits for the request to be resolved.
    pub async fn outcome(self) -> Outcome {
        match self.pending {
            Pending::Now(outcome) => outcome,
            Pending::Deferred(join) => match join.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(err = e.to_string(), clip = %self.id, "Deferred playback failed");
                    Outcome::Superseded
                }
            },
        }
    }
}

#[derive(Default)]
struct State {
    /// The handle most recently started.
    current: Option<Arc<AudioHandle>>,
    /// Bumped by every request so stale deferred starts can tell they've been superseded.
    generation: u64,
}

/// Plays clips one at a time. Starting a clip always stops the one before it.
pub struct Player {
    cache: Arc<ClipCache>,
    fallback: Arc<Fallback>,
    state: Arc<Mutex<State>>,
    events: broadcast::Sender<PlayerEvent>,
    span: Span,
}

impl Player {
    /// Creates a new player that loads clips from the given directory.
    pub fn new(device: Arc<dyn audio::Device>, root: &Path, fallback: Arc<Fallback>) -> Player {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Player {
            cache: Arc::new(ClipCache::new(device, root)),
            fallback,
            state: Arc::new(Mutex::new(State::default())),
            events,
            span: span!(Level::INFO, "player"),
        }
    }

    pub fn cache(&self) -> &ClipCache {
        &self.cache
    }

    /// Subscribes to player events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// The identifier of the current clip, if there is one.
    pub fn current(&self) -> Option<ClipId> {
        self.state
            .lock()
            .current
            .as_ref()
            .map(|handle| handle.id().clone())
    }

    /// Returns true if the current clip is playing.
    pub fn is_playing(&self) -> bool {
        self.state
            .lock()
            .current
            .as_ref()
            .is_some_and(|handle| handle.is_playing())
    }

    /// Plays the given clip. Whatever is playing is stopped first. A cached clip starts right
    /// away; otherwise it starts once loaded, or is spoken if it can't be loaded. Never
    /// blocks.
    pub fn play(&self, id: &ClipId) -> Playback {
        let _enter = self.span.enter();

        let mut state = self.state.lock();
        state.generation += 1;
        let generation = state.generation;

        if let Some(current) = state.current.as_ref() {
            if current.stop() {
                info!(clip = %current.id(), "Stopped current clip");
            }
        }

        let (handle, fresh) = self.cache.get_or_load(id);
        if handle.is_ready() {
            let outcome = match Self::start(&mut state, handle, &self.events) {
                Some(run) => Outcome::Playing(run),
                None => Outcome::Superseded,
            };
            return Playback {
                id: id.clone(),
                pending: Pending::Now(outcome),
            };
        }
        drop(state);

        info!(clip = %id, fresh, "Clip isn't loaded yet, playing once it is");
        let join = tokio::spawn(Self::play_when_loaded(
            handle,
            generation,
            self.state.clone(),
            self.fallback.clone(),
            self.events.clone(),
        ));

        Playback {
            id: id.clone(),
            pending: Pending::Deferred(join),
        }
    }

    /// Restarts the current clip from the beginning. Returns None if there's no current clip.
    pub fn replay(&self) -> Option<Run> {
        let _enter = self.span.enter();

        let mut state = self.state.lock();
        state.generation += 1;
        let handle = state.current.clone()?;
        info!(clip = %handle.id(), "Replaying clip");
        Self::start(&mut state, handle, &self.events)
    }

    /// Stops the current clip. Pending loads won't start playing either. Returns true if
    /// something was playing.
    pub fn stop(&self) -> bool {
        let _enter = self.span.enter();

        let mut state = self.state.lock();
        state.generation += 1;
        let stopped = state
            .current
            .as_ref()
            .is_some_and(|handle| handle.stop());
        if stopped {
            info!(current = ?state.current.as_ref().map(|h| h.id().clone()), "Stopped playback");
        }
        stopped
    }

    /// Makes the handle current and starts it, stopping the previous current handle.
    fn start(
        state: &mut State,
        handle: Arc<AudioHandle>,
        events: &broadcast::Sender<PlayerEvent>,
    ) -> Option<Run> {
        if let Some(previous) = state.current.replace(handle.clone()) {
            previous.stop();
        }

        let Some(run) = handle.start() else {
            error!(clip = %handle.id(), "Clip was ready but couldn't be started");
            return None;
        };
        info!(clip = %handle.id(), "Playing clip");
        let _ = events.send(PlayerEvent::Started(handle.id().clone()));

        let watched = run.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let id = watched.id().clone();
            let event = match watched.finished().await {
                RunStatus::Stopped => PlayerEvent::Stopped(id),
                _ => PlayerEvent::Ended(id),
            };
            let _ = events.send(event);
        });

        Some(run)
    }

    async fn play_when_loaded(
        handle: Arc<AudioHandle>,
        generation: u64,
        state: Arc<Mutex<State>>,
        fallback: Arc<Fallback>,
        events: broadcast::Sender<PlayerEvent>,
    ) -> Outcome {
        let id = handle.id().clone();

        match handle.loaded().await {
            Ok(()) => {
                let mut state = state.lock();
                if state.generation != generation {
                    info!(clip = %id, "Clip loaded after a newer request, not playing it");
                    return Outcome::Superseded;
                }
                match Self::start(&mut state, handle, &events) {
                    Some(run) => Outcome::Playing(run),
                    None => Outcome::Superseded,
                }
            }
            Err(LoadError::Missing { reason, .. }) => {
                let _ = events.send(PlayerEvent::Missing {
                    id: id.clone(),
                    reason,
                });
                info!(clip = %id, "Clip is missing, speaking it instead");
                let _ = events.send(PlayerEvent::Fallback(id.clone()));
                let text = id.to_string();
                match tokio::task::spawn_blocking(move || fallback.speak(&text)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(err = e.to_string(), clip = %id, "Speech fallback failed"),
                    Err(e) => error!(err = e.to_string(), clip = %id, "Speech fallback panicked"),
                }
                Outcome::Fallback
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, time::Duration};

    use super::{Outcome, PlayerEvent};
    use crate::{
        audio::mock::{ClipEvent, Device},
        clip::ClipId,
        testutil::{eventually, harness},
    };

    fn has_event(device: &Device, name: &str, event: ClipEvent) -> bool {
        device.events_for(name).iter().any(|(e, _)| *e == event)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_play_stops_previous_clip() -> Result<(), Box<dyn Error>> {
        let device = Device::get("mock-device")
            .with_clip("pani.mp3", Duration::from_secs(5))
            .with_clip("kitab.mp3", Duration::from_secs(5));
        let h = harness(device.clone());
        let pani = ClipId::from("pani.mp3");
        let kitab = ClipId::from("kitab.mp3");

        let playback = h.player.play(&pani);
        assert!(playback.is_deferred());
        assert!(matches!(playback.outcome().await, Outcome::Playing(_)));
        assert!(h.player.is_playing());
        assert_eq!(Some(pani.clone()), h.player.current());

        assert!(matches!(
            h.player.play(&kitab).outcome().await,
            Outcome::Playing(_)
        ));
        let first = h.player.cache().get(&pani).expect("pani should be cached");
        assert!(!first.is_playing());
        assert_eq!(Duration::ZERO, first.position());
        assert_eq!(Some(kitab.clone()), h.player.current());
        eventually(
            || has_event(&device, "pani.mp3", ClipEvent::Stopped),
            "First clip was never stopped",
        );

        // A cached clip starts without waiting for anything.
        let playback = h.player.play(&pani);
        assert!(!playback.is_deferred());
        assert!(matches!(playback.outcome().await, Outcome::Playing(_)));
        let second = h.player.cache().get(&kitab).expect("kitab should be cached");
        assert!(!second.is_playing());
        assert_eq!(1, device.load_count("pani.mp3"));

        h.player.stop();
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deferred_start_is_superseded() {
        let device = Device::get("mock-device")
            .with_clip("pani.mp3", Duration::from_secs(5))
            .with_clip("kitab.mp3", Duration::from_secs(5))
            .with_load_delay(Duration::from_millis(100));
        let h = harness(device.clone());
        let pani = ClipId::from("pani.mp3");
        let kitab = ClipId::from("kitab.mp3");

        let first = h.player.play(&pani);
        let second = h.player.play(&kitab);

        assert!(matches!(first.outcome().await, Outcome::Superseded));
        assert!(matches!(second.outcome().await, Outcome::Playing(_)));

        // The stale load still landed in the cache, it just never played.
        assert!(h.player.cache().contains(&pani));
        assert!(device.events_for("pani.mp3").is_empty());
        assert_eq!(Some(kitab), h.player.current());

        h.player.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_clip_is_spoken() {
        let device = Device::get("mock-device");
        let h = harness(device.clone());
        let mut events = h.player.subscribe();
        let id = ClipId::from("nonexistent.mp3");

        assert!(matches!(
            h.player.play(&id).outcome().await,
            Outcome::Fallback
        ));

        let spoken = h.engine.spoken();
        assert_eq!(1, spoken.len());
        assert_eq!("nonexistent.mp3", spoken[0].text);
        assert!(!h.player.cache().contains(&id));
        assert_eq!(None, h.player.current());
        assert!(h.notifier.alerts().is_empty());

        assert!(matches!(
            events.recv().await,
            Ok(PlayerEvent::Missing { id: ref missing, .. }) if *missing == id
        ));
        assert_eq!(Ok(PlayerEvent::Fallback(id)), events.recv().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_clip_is_spoken_after_a_newer_request() {
        let device = Device::get("mock-device")
            .with_clip("kitab.mp3", Duration::from_secs(5))
            .with_load_delay(Duration::from_millis(50));
        let h = harness(device.clone());
        let missing = ClipId::from("nonexistent.mp3");
        let kitab = ClipId::from("kitab.mp3");

        let first = h.player.play(&missing);
        let second = h.player.play(&kitab);

        assert!(matches!(first.outcome().await, Outcome::Fallback));
        assert!(matches!(second.outcome().await, Outcome::Playing(_)));

        let spoken = h.engine.spoken();
        assert_eq!(1, spoken.len());
        assert_eq!("nonexistent.mp3", spoken[0].text);
        assert!(!h.player.cache().contains(&missing));
        assert_eq!(Some(kitab), h.player.current());

        h.player.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replay_and_stop() -> Result<(), Box<dyn Error>> {
        let device = Device::get("mock-device").with_clip("dost.mp3", Duration::from_secs(5));
        let h = harness(device.clone());
        let mut events = h.player.subscribe();
        let id = ClipId::from("dost.mp3");

        assert!(h.player.replay().is_none());
        assert!(!h.player.stop());

        let Outcome::Playing(run) = h.player.play(&id).outcome().await else {
            panic!("expected the clip to play");
        };
        assert_eq!(Ok(PlayerEvent::Started(id.clone())), events.recv().await);

        assert!(h.player.stop());
        assert!(!h.player.is_playing());
        assert_eq!(crate::cache::RunStatus::Stopped, run.finished().await);
        assert_eq!(Ok(PlayerEvent::Stopped(id.clone())), events.recv().await);

        let run = h.player.replay().expect("replay should start the clip");
        assert!(h.player.is_playing());
        assert_eq!(Ok(PlayerEvent::Started(id.clone())), events.recv().await);
        eventually(
            || {
                device
                    .events_for("dost.mp3")
                    .iter()
                    .filter(|(e, _)| *e == ClipEvent::Started)
                    .count()
                    == 2
            },
            "Clip was never replayed",
        );

        h.player.stop();
        assert_eq!(crate::cache::RunStatus::Stopped, run.finished().await);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clip_ends() {
        let device = Device::get("mock-device").with_clip("dost.mp3", Duration::from_millis(50));
        let h = harness(device.clone());
        let mut events = h.player.subscribe();
        let id = ClipId::from("dost.mp3");

        let Outcome::Playing(run) = h.player.play(&id).outcome().await else {
            panic!("expected the clip to play");
        };
        assert_eq!(crate::cache::RunStatus::Ended, run.finished().await);
        assert_eq!(Ok(PlayerEvent::Started(id.clone())), events.recv().await);
        assert_eq!(Ok(PlayerEvent::Ended(id.clone())), events.recv().await);
        assert!(!h.player.is_playing());
        assert_eq!(Some(id), h.player.current());
    }
}
