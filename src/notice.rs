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
use std::io;

use tracing::error;

pub mod mock;

/// The user-facing notice surface: blocking alerts and prompts.
pub trait Notifier: Send + Sync {
    /// Shows a message the user has to see.
    fn alert(&self, message: &str);

    /// Asks the user for a line of input. Blocks until they answer. Returns None if the
    /// prompt was dismissed.
    fn prompt(&self, message: &str) -> Option<String>;
}

/// A notifier that talks to the user through stdin and stdout.
#[derive(Default)]
pub struct Terminal {}

impl Terminal {
    pub fn new() -> Terminal {
        Terminal {}
    }

    fn alert_io<W>(mut writer: W, message: &str) -> Result<(), io::Error>
    where
        W: io::Write,
    {
        writeln!(writer, "{}", message)?;
        writer.flush()
    }

    fn prompt_io<R, W>(
        mut reader: R,
        mut writer: W,
        message: &str,
    ) -> Result<Option<String>, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(writer, "{} ", message)?;
        writer.flush()?;

        let mut input = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(None);
        }

        // Only the line ending goes; the answer is otherwise kept verbatim.
        if input.ends_with('\n') {
            input.pop();
            if input.ends_with('\r') {
                input.pop();
            }
        }
        Ok(Some(input))
    }
}

impl Notifier for Terminal {
    fn alert(&self, message: &str) {
        if let Err(e) = Self::alert_io(io::stdout().lock(), message) {
            error!(err = e.to_string(), "Unable to show notice");
        }
    }

    fn prompt(&self, message: &str) -> Option<String> {
        let stdin = io::stdin();
        let reader = stdin.lock();
        match Self::prompt_io(reader, io::stdout().lock(), message) {
            Ok(answer) => answer,
            Err(e) => {
                error!(err = e.to_string(), "Unable to read answer");
                None
            }
        }
    }
}
