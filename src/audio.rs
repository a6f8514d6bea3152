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
use std::{error::Error, fmt, path::Path, sync::Arc, time::Duration};

use crate::config;
use crate::playsync::CancelHandle;

pub mod cpal;
pub mod decode;
pub mod mock;

/// The media engine. Knows how to turn a clip path into something playable.
pub trait Device: fmt::Display + Send + Sync {
    /// Loads the clip at the given path. Blocks until the clip is decoded or fails.
    fn load(&self, path: &Path) -> Result<Arc<dyn Clip>, Box<dyn Error>>;
}

/// A loaded, replayable clip.
pub trait Clip: Send + Sync {
    /// The length of the clip.
    fn duration(&self) -> Duration;

    /// Plays the clip from the start. Blocks until the clip ends or the cancel handle is
    /// cancelled.
    fn play(&self, cancel_handle: CancelHandle) -> Result<(), Box<dyn Error>>;
}

/// Lists the output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device described by the given configuration.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}
