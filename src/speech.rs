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

//! Synthesized speech for clips that can't be played.

use std::{error::Error, fmt, sync::Arc};

use thiserror::Error;
use tracing::{info, span, warn, Level, Span};

use crate::config;
use crate::notice::Notifier;

pub mod espeak;
pub mod mock;

/// Speech is slowed down so learners can follow it.
pub const DEFAULT_RATE: f32 = 0.8;

/// Speech pitch is left alone.
pub const DEFAULT_PITCH: f32 = 1.0;

/// A voice offered by a speech engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    /// The BCP 47 style language tag, e.g. "ur-PK".
    language: String,
    /// The human readable voice name.
    name: String,
}

impl Voice {
    pub fn new(language: &str, name: &str) -> Voice {
        Voice {
            language: language.to_string(),
            name: name.to_string(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the primary subtag of the voice language is the given code.
    fn speaks(&self, code: &str) -> bool {
        let primary = self
            .language
            .split(['-', '_'])
            .next()
            .unwrap_or_default();
        !code.is_empty() && primary.eq_ignore_ascii_case(code)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.language)
    }
}

/// A single request to speak some text.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// None means the engine's default voice.
    pub voice: Option<Voice>,
    /// Multiplier of the normal speaking rate.
    pub rate: f32,
    /// Multiplier of the normal pitch.
    pub pitch: f32,
}

/// A speech synthesis engine.
pub trait Engine: Send + Sync {
    /// The voices the engine offers.
    fn voices(&self) -> Vec<Voice>;

    /// Starts speaking the utterance. Does not wait for speech to finish.
    fn speak(&self, utterance: &Utterance) -> Result<(), Box<dyn Error>>;

    /// Cuts off anything currently being spoken.
    fn cancel(&self);
}

/// The language speech is synthesized in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Language {
    /// The language code voices are matched against first.
    pub code: String,
    /// A related language code to try when no voice speaks the target language.
    pub fallback_code: String,
    /// Matched against voice names when no language code matches.
    pub name: String,
}

impl Default for Language {
    fn default() -> Self {
        Language {
            code: "ur".to_string(),
            fallback_code: "hi".to_string(),
            name: "urdu".to_string(),
        }
    }
}

/// Picks the voice to speak the given language with. Prefers the language code, then the
/// fallback code, then a voice whose name mentions the language. None means the engine's
/// default voice should be used.
pub fn select_voice<'a>(voices: &'a [Voice], language: &Language) -> Option<&'a Voice> {
    let name = language.name.to_lowercase();
    voices
        .iter()
        .find(|voice| voice.speaks(&language.code))
        .or_else(|| {
            voices
                .iter()
                .find(|voice| voice.speaks(&language.fallback_code))
        })
        .or_else(|| {
            voices
                .iter()
                .find(|voice| !name.is_empty() && voice.name.to_lowercase().contains(&name))
        })
}

/// Errors raised while speaking.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis is not available")]
    Unavailable,
    #[error("speech engine error: {0}")]
    Engine(String),
}

/// Speaks text when a recorded clip isn't available.
pub struct Fallback {
    /// The engine, if the host has one.
    engine: Option<Arc<dyn Engine>>,
    /// Where to tell the user that speech isn't available.
    notifier: Arc<dyn Notifier>,
    language: Language,
    rate: f32,
    span: Span,
}

impl Fallback {
    pub fn new(
        engine: Option<Arc<dyn Engine>>,
        notifier: Arc<dyn Notifier>,
        language: Language,
        rate: f32,
    ) -> Fallback {
        Fallback {
            engine,
            notifier,
            language,
            rate,
            span: span!(Level::INFO, "speech fallback"),
        }
    }

    /// Returns true if there's an engine to speak with.
    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    /// Speaks the given text, cutting off anything still being spoken. If the host has no
    /// speech engine the user is told so.
    pub fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let _enter = self.span.enter();

        let Some(engine) = self.engine.as_ref() else {
            warn!(text, "No speech engine available");
            self.notifier.alert(&format!(
                "Speech synthesis is not available on this system, so \"{}\" can't be spoken.",
                text
            ));
            return Err(SpeechError::Unavailable);
        };

        engine.cancel();

        let voices = engine.voices();
        let voice = select_voice(&voices, &self.language).cloned();
        info!(
            text,
            voice = voice.as_ref().map(|v| v.to_string()),
            rate = self.rate,
            "Speaking."
        );

        engine
            .speak(&Utterance {
                text: text.to_string(),
                voice,
                rate: self.rate,
                pitch: DEFAULT_PITCH,
            })
            .map_err(|e| SpeechError::Engine(e.to_string()))
    }
}

/// Gets the speech engine named by the configuration. Returns None if speech is turned off
/// or the engine isn't installed.
pub fn get_engine(config: &config::Speech) -> Option<Arc<dyn Engine>> {
    match config.engine() {
        "none" => None,
        "mock" => Some(Arc::new(mock::Engine::new(vec![Voice::new(
            &config.language().code,
            "Mock",
        )]))),
        _ => match espeak::Engine::detect() {
            Some(engine) => Some(Arc::new(engine)),
            None => {
                warn!("No espeak-ng or espeak binary found, speech fallback is unavailable");
                None
            }
        },
    }
}
