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
use std::{
    collections::HashMap,
    error::Error,
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::{info, span, Level};

use crate::playsync::CancelHandle;

/// How long a clip found on disk plays for when it wasn't registered explicitly.
const DEFAULT_CLIP_DURATION: Duration = Duration::from_millis(500);

/// Something that happened to a mock clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipEvent {
    Started,
    Ended,
    Stopped,
}

#[derive(Default)]
struct State {
    /// Registered clip durations by file name.
    clips: HashMap<String, Duration>,
    /// Number of loads per file name.
    loads: HashMap<String, usize>,
    /// Everything that happened, in order.
    events: Vec<(String, ClipEvent, Instant)>,
}

/// A mock device. Doesn't actually play anything, but plays for the right amount of time
/// and keeps a record of what happened.
#[derive(Clone)]
pub struct Device {
    name: String,
    load_delay: Duration,
    state: Arc<Mutex<State>>,
    playing: Arc<AtomicUsize>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            load_delay: Duration::ZERO,
            state: Arc::new(Mutex::new(State::default())),
            playing: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every load take the given amount of time.
    pub fn with_load_delay(mut self, load_delay: Duration) -> Device {
        self.load_delay = load_delay;
        self
    }

    /// Registers a clip that will load successfully with the given duration.
    pub fn with_clip(self, name: &str, duration: Duration) -> Device {
        self.state.lock().clips.insert(name.to_string(), duration);
        self
    }

    /// Returns how many times the clip with the given file name was loaded.
    pub fn load_count(&self, name: &str) -> usize {
        self.state.lock().loads.get(name).copied().unwrap_or(0)
    }

    /// Returns the recorded clip events.
    pub fn events(&self) -> Vec<(String, ClipEvent, Instant)> {
        self.state.lock().events.clone()
    }

    /// Returns the recorded events for the given clip.
    pub fn events_for(&self, name: &str) -> Vec<(ClipEvent, Instant)> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|(clip, _, _)| clip == name)
            .map(|(_, event, at)| (*event, *at))
            .collect()
    }

    /// Returns true if any clip is currently playing.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst) > 0
    }

    fn record(&self, name: &str, event: ClipEvent) {
        self.state
            .lock()
            .events
            .push((name.to_string(), event, Instant::now()));
    }
}

impl crate::audio::Device for Device {
    fn load(&self, path: &Path) -> Result<Arc<dyn crate::audio::Clip>, Box<dyn Error>> {
        if !self.load_delay.is_zero() {
            thread::sleep(self.load_delay);
        }

        let name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or_default()
            .to_string();

        let duration = {
            let mut state = self.state.lock();
            *state.loads.entry(name.clone()).or_insert(0) += 1;
            match state.clips.get(&name) {
                Some(duration) => *duration,
                None if path.is_file() => DEFAULT_CLIP_DURATION,
                None => return Err(format!("{} not found", path.display()).into()),
            }
        };

        Ok(Arc::new(Clip {
            name,
            duration,
            device: self.clone(),
        }))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

/// A mock clip that sleeps for its duration or until cancelled.
struct Clip {
    name: String,
    duration: Duration,
    device: Device,
}

impl crate::audio::Clip for Clip {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn play(&self, cancel_handle: CancelHandle) -> Result<(), Box<dyn Error>> {
        let span = span!(Level::INFO, "play clip (mock)");
        let _enter = span.enter();

        info!(
            device = self.device.name,
            clip = self.name,
            duration_ms = self.duration.as_millis() as u64,
            "Playing clip."
        );

        self.device.playing.fetch_add(1, Ordering::SeqCst);
        self.device.record(&self.name, ClipEvent::Started);

        let cancelled = cancel_handle.wait_timeout(self.duration);

        self.device.playing.fetch_sub(1, Ordering::SeqCst);
        self.device.record(
            &self.name,
            if cancelled {
                ClipEvent::Stopped
            } else {
                ClipEvent::Ended
            },
        );
        Ok(())
    }
}
