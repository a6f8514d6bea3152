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

//! YAML configuration for the player and the vocabulary.

mod audio;
mod error;
mod player;
mod speech;
mod vocabulary;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use duration_string::DurationString;

use crate::controller;
use crate::notice::Notifier;
use crate::speech::Fallback;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::player::{Keyboard, Player, Practice};
pub use self::speech::Speech;
pub use self::vocabulary::{Category, Item, Vocabulary};

/// Parses a human readable duration such as "1s" or "2000ms", or returns the default if
/// there isn't one.
fn parse_duration(
    field: &str,
    value: Option<&String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => DurationString::from_string(value.clone())
            .map(Duration::from)
            .map_err(|e| ConfigError::Duration {
                field: field.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

/// Parses a vocabulary from a YAML file.
pub fn load_vocabulary(path: &Path) -> Result<crate::vocabulary::Vocabulary, ConfigError> {
    Vocabulary::deserialize(path)?.to_vocabulary()
}

/// Initializes the player from the given configuration. Notices from the speech fallback
/// go to the given notifier.
pub fn init_player(
    config: &Player,
    notifier: Arc<dyn Notifier>,
) -> Result<Arc<crate::player::Player>, Box<dyn Error>> {
    let device = crate::audio::get_device(&config.audio())?;
    let speech_config = config.speech();
    let fallback = Fallback::new(
        crate::speech::get_engine(&speech_config),
        notifier,
        speech_config.language(),
        speech_config.rate()?,
    );
    Ok(Arc::new(crate::player::Player::new(
        device,
        &config.resource_root(),
        Arc::new(fallback),
    )))
}

/// Initializes the player and a keyboard controller from the given configuration and returns
/// the controller. The controller runs until the keyboard input is closed.
pub fn init_player_and_controller(
    config: &Player,
    notifier: Arc<dyn Notifier>,
) -> Result<controller::Controller, Box<dyn Error>> {
    let player = init_player(config, notifier)?;
    let vocabulary = load_vocabulary(&config.vocabulary())?;
    let driver = Arc::new(controller::keyboard::Driver::new(&config.keyboard()));
    Ok(controller::Controller::new(
        player,
        Arc::new(vocabulary),
        config.sequence_delay()?,
        driver,
    ))
}
