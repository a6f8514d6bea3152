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
use serde::Deserialize;

use super::ConfigError;
use crate::speech::{Language, DEFAULT_RATE};

const DEFAULT_ENGINE: &str = "espeak";

/// The speech fallback configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Speech {
    /// "espeak", "mock", or "none".
    engine: Option<String>,
    /// The language code to pick a voice for.
    language: Option<String>,
    /// A related language code to use when nothing speaks the target language.
    fallback_language: Option<String>,
    /// Matched against voice names as a last resort.
    language_name: Option<String>,
    /// Multiplier of the normal speaking rate.
    rate: Option<f32>,
}

impl Speech {
    pub fn engine(&self) -> &str {
        self.engine.as_deref().unwrap_or(DEFAULT_ENGINE)
    }

    /// The language to speak, with unset parts taken from the default.
    pub fn language(&self) -> Language {
        let default = Language::default();
        Language {
            code: self.language.clone().unwrap_or(default.code),
            fallback_code: self.fallback_language.clone().unwrap_or(default.fallback_code),
            name: self.language_name.clone().unwrap_or(default.name),
        }
    }

    /// The speaking rate. Must be positive.
    pub fn rate(&self) -> Result<f32, ConfigError> {
        match self.rate {
            Some(rate) if !rate.is_finite() || rate <= 0.0 => Err(ConfigError::Invalid(format!(
                "speech rate must be positive, got {}",
                rate
            ))),
            Some(rate) => Ok(rate),
            None => Ok(DEFAULT_RATE),
        }
    }
}
