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
use std::collections::VecDeque;

use parking_lot::Mutex;

/// A notifier that answers prompts from a script and remembers everything it was shown.
pub struct Notifier {
    answers: Mutex<VecDeque<Option<String>>>,
    alerts: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl Notifier {
    /// Creates a notifier that answers prompts with the given answers, in order. Once the
    /// script runs out, prompts are dismissed.
    pub fn new(answers: Vec<Option<String>>) -> Notifier {
        Notifier {
            answers: Mutex::new(answers.into()),
            alerts: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every alert shown so far.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }

    /// Every prompt shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl super::Notifier for Notifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }

    fn prompt(&self, message: &str) -> Option<String> {
        self.prompts.lock().push(message.to_string());
        self.answers.lock().pop_front().flatten()
    }
}
