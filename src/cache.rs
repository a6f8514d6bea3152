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

//! Clip loading and caching.
//!
//! Each identifier is loaded at most once. Loaded handles stay in the cache for the life of
//! the process; nothing is ever evicted.

mod handle;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, span, warn, Level, Span};

use crate::audio;
use crate::clip::ClipId;

pub use handle::{AudioHandle, LoadState, Run, RunStatus};

/// Raised when a clip could not be loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("clip {id} is missing: {reason}")]
    Missing { id: ClipId, reason: String },
}

#[derive(Default)]
struct Tables {
    /// Successfully loaded handles.
    entries: HashMap<ClipId, Arc<AudioHandle>>,
    /// Handles whose load is still in flight.
    pending: HashMap<ClipId, Arc<AudioHandle>>,
}

/// Maps clip identifiers to loaded handles.
pub struct ClipCache {
    /// The media engine used to load clips.
    device: Arc<dyn audio::Device>,
    /// Clip identifiers are resolved against this directory.
    root: PathBuf,
    tables: Arc<Mutex<Tables>>,
    span: Span,
}

impl ClipCache {
    /// Creates an empty cache.
    pub fn new(device: Arc<dyn audio::Device>, root: &Path) -> ClipCache {
        ClipCache {
            device,
            root: root.to_path_buf(),
            tables: Arc::new(Mutex::new(Tables::default())),
            span: span!(Level::INFO, "clip cache"),
        }
    }

    /// Returns the handle for the given identifier and whether this call started a fresh
    /// load. A cached or already loading handle is returned as is. Otherwise a load is
    /// started in the background and the still-loading handle is returned right away.
    pub fn get_or_load(&self, id: &ClipId) -> (Arc<AudioHandle>, bool) {
        let _enter = self.span.enter();

        let handle = {
            let mut tables = self.tables.lock();
            if let Some(handle) = tables.entries.get(id) {
                debug!(clip = %id, "Using cached clip");
                return (handle.clone(), false);
            }
            if let Some(handle) = tables.pending.get(id) {
                debug!(clip = %id, "Clip is already loading");
                return (handle.clone(), false);
            }

            let handle = Arc::new(AudioHandle::loading(id.clone()));
            tables.pending.insert(id.clone(), handle.clone());
            handle
        };

        let path = id.resolve(&self.root);
        info!(clip = %id, path = ?path, "Loading clip");

        let device = self.device.clone();
        let tables = self.tables.clone();
        let loading = handle.clone();
        tokio::task::spawn_blocking(move || {
            let result = device.load(&path).map_err(|e| e.to_string());

            let id = loading.id().clone();
            {
                let mut tables = tables.lock();
                tables.pending.remove(&id);
                if result.is_ok() {
                    tables.entries.insert(id.clone(), loading.clone());
                }
            }

            match result {
                Ok(clip) => {
                    info!(
                        clip = %id,
                        duration_ms = clip.duration().as_millis() as u64,
                        "Clip loaded"
                    );
                    loading.set_ready(clip);
                }
                Err(reason) => {
                    warn!(clip = %id, reason, "Clip is missing");
                    loading.set_missing(reason);
                }
            }
        });

        (handle, true)
    }

    /// Returns the cached handle for the identifier without loading anything.
    pub fn get(&self, id: &ClipId) -> Option<Arc<AudioHandle>> {
        self.tables.lock().entries.get(id).cloned()
    }

    /// Returns true if the identifier has been loaded successfully.
    pub fn contains(&self, id: &ClipId) -> bool {
        self.tables.lock().entries.contains_key(id)
    }

    /// The number of loaded clips.
    pub fn len(&self) -> usize {
        self.tables.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The identifiers of all loaded clips, sorted.
    pub fn loaded_ids(&self) -> Vec<ClipId> {
        let mut ids: Vec<ClipId> = self.tables.lock().entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for ClipCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.lock();
        f.debug_struct("ClipCache")
            .field("device", &self.device.to_string())
            .field("root", &self.root)
            .field("cached_clips", &tables.entries.len())
            .field("pending_clips", &tables.pending.len())
            .finish()
    }
}
