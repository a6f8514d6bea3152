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
    fmt,
    sync::{Arc, OnceLock},
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error};

use super::LoadError;
use crate::audio::Clip;
use crate::clip::ClipId;
use crate::playsync::CancelHandle;

/// The load state of a handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Missing(String),
}

/// The state of a single run of a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Playing,
    /// The clip played through to its natural end.
    Ended,
    /// The clip was stopped before its end.
    Stopped,
}

struct ActiveRun {
    cancel: CancelHandle,
    started: Instant,
    status: watch::Sender<RunStatus>,
}

/// A stateful handle to one clip. Created on the first lookup of an identifier and shared
/// by everyone who looks it up afterwards.
pub struct AudioHandle {
    id: ClipId,
    load: watch::Sender<LoadState>,
    clip: OnceLock<Arc<dyn Clip>>,
    run: Mutex<Option<ActiveRun>>,
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioHandle")
            .field("id", &self.id)
            .field("load", &*self.load.borrow())
            .field("playing", &self.is_playing())
            .finish()
    }
}

impl AudioHandle {
    /// Creates a handle whose clip is still loading.
    pub(super) fn loading(id: ClipId) -> AudioHandle {
        let (load, _) = watch::channel(LoadState::Loading);
        AudioHandle {
            id,
            load,
            clip: OnceLock::new(),
            run: Mutex::new(None),
        }
    }

    pub(super) fn set_ready(&self, clip: Arc<dyn Clip>) {
        if self.clip.set(clip).is_err() {
            error!(clip = %self.id, "Clip was loaded twice");
        }
        self.load.send_replace(LoadState::Ready);
    }

    pub(super) fn set_missing(&self, reason: String) {
        self.load.send_replace(LoadState::Missing(reason));
    }

    pub fn id(&self) -> &ClipId {
        &self.id
    }

    pub fn load_state(&self) -> LoadState {
        self.load.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        *self.load.borrow() == LoadState::Ready
    }

    /// Waits for the load to finish one way or the other.
    pub async fn loaded(&self) -> Result<(), LoadError> {
        let mut rx = self.load.subscribe();
        let state = match rx.wait_for(|state| *state != LoadState::Loading).await {
            Ok(state) => state.clone(),
            // The sender lives in self, so this can't really happen.
            Err(_) => LoadState::Missing("handle dropped".to_string()),
        };

        match state {
            LoadState::Missing(reason) => Err(LoadError::Missing {
                id: self.id.clone(),
                reason,
            }),
            _ => Ok(()),
        }
    }

    /// The length of the clip, if loaded.
    pub fn duration(&self) -> Option<Duration> {
        self.clip.get().map(|clip| clip.duration())
    }

    /// Returns true if the latest run is still playing.
    pub fn is_playing(&self) -> bool {
        self.run
            .lock()
            .as_ref()
            .is_some_and(|run| *run.status.borrow() == RunStatus::Playing)
    }

    /// The play position. Zero unless playing or ended.
    pub fn position(&self) -> Duration {
        let run = self.run.lock();
        let Some(run) = run.as_ref() else {
            return Duration::ZERO;
        };
        let duration = self.duration().unwrap_or_default();
        let status = *run.status.borrow();
        match status {
            RunStatus::Playing => run.started.elapsed().min(duration),
            RunStatus::Ended => duration,
            RunStatus::Stopped => Duration::ZERO,
        }
    }

    /// Starts a new run from position zero, stopping any run in progress. Returns None if the
    /// clip isn't loaded.
    pub fn start(&self) -> Option<Run> {
        let clip = self.clip.get()?.clone();

        let mut run = self.run.lock();
        if let Some(previous) = run.take() {
            Self::stop_run(&previous);
        }

        let cancel = CancelHandle::new();
        let (status, status_rx) = watch::channel(RunStatus::Playing);
        *run = Some(ActiveRun {
            cancel: cancel.clone(),
            started: Instant::now(),
            status: status.clone(),
        });

        let id = self.id.clone();
        thread::spawn(move || {
            if let Err(e) = clip.play(cancel.clone()) {
                error!(err = e.as_ref(), clip = %id, "Error while playing clip");
            }
            // A stop has already published Stopped, so only a natural end lands here.
            status.send_if_modified(|status| {
                if *status != RunStatus::Playing {
                    return false;
                }
                *status = if cancel.is_cancelled() {
                    RunStatus::Stopped
                } else {
                    RunStatus::Ended
                };
                true
            });
            debug!(clip = %id, "Run finished");
        });

        Some(Run {
            id: self.id.clone(),
            status: status_rx,
        })
    }

    /// Stops the current run, if any, and resets the position to zero. Returns true if
    /// something was actually playing.
    pub fn stop(&self) -> bool {
        let run = self.run.lock();
        match run.as_ref() {
            Some(active) if *active.status.borrow() == RunStatus::Playing => {
                Self::stop_run(active);
                true
            }
            _ => false,
        }
    }

    fn stop_run(run: &ActiveRun) {
        run.status.send_if_modified(|status| {
            if *status != RunStatus::Playing {
                return false;
            }
            *status = RunStatus::Stopped;
            true
        });
        run.cancel.cancel();
    }
}

/// One playback of a handle, from position zero until it ends or is stopped.
#[derive(Clone, Debug)]
pub struct Run {
    id: ClipId,
    status: watch::Receiver<RunStatus>,
}

impl Run {
    pub fn id(&self) -> &ClipId {
        &self.id
    }

    pub fn status(&self) -> RunStatus {
        *self.status.borrow()
    }

    /// Waits for the run to end or be stopped.
    pub async fn finished(mut self) -> RunStatus {
        let status = match self
            .status
            .wait_for(|status| *status != RunStatus::Playing)
            .await
        {
            Ok(status) => *status,
            Err(_) => RunStatus::Stopped,
        };
        status
    }
}
