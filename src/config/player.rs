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
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, File};
use serde::Deserialize;

use super::{parse_duration, Audio, ConfigError, Speech};
use crate::{practice, sequencer};

const DEFAULT_RESOURCE_ROOT: &str = "assets/audio";
const DEFAULT_VOCABULARY: &str = "vocabulary.yaml";
const DEFAULT_REPLAY_KEY: &str = "r";
const DEFAULT_STOP_KEY: &str = "s";
const DEFAULT_SEQUENCE_KEY: &str = "seq";

/// The configuration for the clip player.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Player {
    /// The directory clips are loaded from.
    resource_root: Option<String>,
    /// The vocabulary file.
    vocabulary: Option<String>,
    /// The audio configuration.
    audio: Option<Audio>,
    /// The speech fallback configuration.
    speech: Option<Speech>,
    /// The pause between clips in a sequence.
    sequence_delay: Option<String>,
    /// The practice session configuration.
    practice: Option<Practice>,
    /// The keyboard bindings.
    keyboard: Option<Keyboard>,

    /// Relative paths are resolved against this directory.
    #[serde(skip)]
    base: PathBuf,
}

impl Player {
    /// Parse the player configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Player, ConfigError> {
        let mut player = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Player>()?;
        player.base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(player)
    }

    /// The directory clips are loaded from.
    pub fn resource_root(&self) -> PathBuf {
        self.base.join(
            self.resource_root
                .as_deref()
                .unwrap_or(DEFAULT_RESOURCE_ROOT),
        )
    }

    /// The vocabulary file.
    pub fn vocabulary(&self) -> PathBuf {
        self.base
            .join(self.vocabulary.as_deref().unwrap_or(DEFAULT_VOCABULARY))
    }

    pub fn audio(&self) -> Audio {
        self.audio.clone().unwrap_or_default()
    }

    pub fn speech(&self) -> Speech {
        self.speech.clone().unwrap_or_default()
    }

    pub fn sequence_delay(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "sequence_delay",
            self.sequence_delay.as_ref(),
            sequencer::DEFAULT_DELAY,
        )
    }

    pub fn practice(&self) -> Practice {
        self.practice.clone().unwrap_or_default()
    }

    pub fn keyboard(&self) -> Keyboard {
        self.keyboard.clone().unwrap_or_default()
    }
}

/// Pacing for practice sessions.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Practice {
    /// How long to wait after playing a clip before asking for its meaning.
    prompt_delay: Option<String>,
    /// How long to wait after showing the result before moving on.
    advance_delay: Option<String>,
    /// Whether to practice items in random order.
    shuffle: Option<bool>,
}

impl Practice {
    pub fn prompt_delay(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "practice.prompt_delay",
            self.prompt_delay.as_ref(),
            practice::DEFAULT_PROMPT_DELAY,
        )
    }

    pub fn advance_delay(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "practice.advance_delay",
            self.advance_delay.as_ref(),
            practice::DEFAULT_ADVANCE_DELAY,
        )
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle.unwrap_or(false)
    }
}

/// Keyboard bindings. Each binding is a line typed on its own.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Keyboard {
    /// Replays the current clip.
    replay: Option<String>,
    /// Stops the current clip.
    stop: Option<String>,
    /// Prefix for playing a vocabulary category as a sequence, e.g. "seq basics".
    sequence: Option<String>,
}

impl Keyboard {
    pub fn replay(&self) -> &str {
        self.replay.as_deref().unwrap_or(DEFAULT_REPLAY_KEY)
    }

    pub fn stop(&self) -> &str {
        self.stop.as_deref().unwrap_or(DEFAULT_STOP_KEY)
    }

    pub fn sequence(&self) -> &str {
        self.sequence.as_deref().unwrap_or(DEFAULT_SEQUENCE_KEY)
    }
}
