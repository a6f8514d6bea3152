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
use std::error::Error;

use parking_lot::Mutex;
use tracing::info;

use super::{Utterance, Voice};

#[derive(Default)]
struct State {
    spoken: Vec<Utterance>,
    cancels: usize,
}

/// A mock speech engine. Doesn't make a sound, but remembers what it was asked to say.
pub struct Engine {
    voices: Vec<Voice>,
    fail: bool,
    state: Mutex<State>,
}

impl Engine {
    /// Creates an engine that offers the given voices.
    pub fn new(voices: Vec<Voice>) -> Engine {
        Engine {
            voices,
            fail: false,
            state: Mutex::new(State::default()),
        }
    }

    /// Makes every utterance fail.
    pub fn failing(mut self) -> Engine {
        self.fail = true;
        self
    }

    /// Every utterance spoken so far.
    pub fn spoken(&self) -> Vec<Utterance> {
        self.state.lock().spoken.clone()
    }

    /// How many times speech was cancelled.
    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancels
    }
}

impl super::Engine for Engine {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), Box<dyn Error>> {
        if self.fail {
            return Err("mock engine failure".into());
        }
        info!(text = utterance.text, "Speaking (mock).");
        self.state.lock().spoken.push(utterance.clone());
        Ok(())
    }

    fn cancel(&self) {
        self.state.lock().cancels += 1;
    }
}
