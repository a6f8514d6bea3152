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
    error::Error,
    process::{Child, Command, Stdio},
};

use parking_lot::Mutex;
use tracing::{debug, error};

use super::{Utterance, Voice};

/// The programs tried, in order.
const PROGRAMS: [&str; 2] = ["espeak-ng", "espeak"];

/// espeak's normal speaking rate in words per minute.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// espeak's normal pitch on its 0-99 scale.
const BASE_PITCH: f32 = 50.0;

/// A speech engine backed by the espeak-ng (or espeak) command line program.
pub struct Engine {
    program: String,
    /// The process speaking the current utterance.
    child: Mutex<Option<Child>>,
}

impl Engine {
    /// Looks for an installed espeak program.
    pub fn detect() -> Option<Engine> {
        PROGRAMS
            .iter()
            .find(|program| {
                Command::new(program)
                    .arg("--version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .is_ok_and(|status| status.success())
            })
            .map(|program| Engine::with_program(program))
    }

    fn with_program(program: &str) -> Engine {
        Engine {
            program: program.to_string(),
            child: Mutex::new(None),
        }
    }

    /// Reaps the current child if it has exited. Returns true if it's still speaking.
    fn reap(&self) -> bool {
        let mut current = self.child.lock();
        let Some(child) = current.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(pid = child.id(), %status, "Speech finished");
                *current = None;
                false
            }
            Err(e) => {
                error!(err = e.to_string(), "Unable to check on speech");
                *current = None;
                false
            }
        }
    }

    fn args(utterance: &Utterance) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(voice) = utterance.voice.as_ref() {
            args.push("-v".to_string());
            args.push(voice.language().to_string());
        }
        let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.rate).round().max(1.0) as u32;
        let pitch = (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32;
        args.push("-s".to_string());
        args.push(words_per_minute.to_string());
        args.push("-p".to_string());
        args.push(pitch.to_string());
        args.push("--".to_string());
        args.push(utterance.text.clone());
        args
    }
}

/// Parses the table printed by `espeak-ng --voices`.
fn parse_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _priority = fields.next()?;
            let language = fields.next()?;
            let _gender = fields.next()?;
            let name = fields.next()?;
            Some(Voice::new(language, &name.replace('_', " ")))
        })
        .collect()
}

impl super::Engine for Engine {
    fn voices(&self) -> Vec<Voice> {
        match Command::new(&self.program)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()
        {
            Ok(output) => parse_voices(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                error!(err = e.to_string(), program = self.program, "Unable to list voices");
                Vec::new()
            }
        }
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), Box<dyn Error>> {
        if self.reap() {
            debug!("Previous utterance is still being spoken");
        }

        let child = Command::new(&self.program)
            .args(Self::args(utterance))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(pid = child.id(), program = self.program, "Started speech");

        let mut current = self.child.lock();
        if let Some(mut previous) = current.replace(child) {
            let _ = previous.kill();
            let _ = previous.wait();
        }
        Ok(())
    }

    fn cancel(&self) {
        if let Some(mut child) = self.child.lock().take() {
            // Killing an already exited child fails harmlessly.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.get_mut().take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::speech::Engine as _;
    use crate::testutil::eventually;

    #[test]
    fn test_parse_voices() {
        let output = "Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  hi              --/M      Hindi              inc/hi
 5  ur              --/M      Urdu               inc/ur
";
        let voices = parse_voices(output);
        assert_eq!(
            vec![
                Voice::new("en-us", "English (America)"),
                Voice::new("hi", "Hindi"),
                Voice::new("ur", "Urdu"),
            ],
            voices
        );
    }

    #[test]
    fn test_args() {
        let args = Engine::args(&Utterance {
            text: "pani".to_string(),
            voice: Some(Voice::new("ur", "Urdu")),
            rate: 0.8,
            pitch: 1.0,
        });
        assert_eq!(
            vec!["-v", "ur", "-s", "140", "-p", "50", "--", "pani"],
            args
        );

        let args = Engine::args(&Utterance {
            text: "pani".to_string(),
            voice: None,
            rate: 1.0,
            pitch: 3.0,
        });
        assert_eq!(vec!["-s", "175", "-p", "99", "--", "pani"], args);
    }

    #[cfg(unix)]
    #[test]
    fn test_finished_speech_is_reaped() {
        let engine = Engine::with_program("true");
        engine
            .speak(&Utterance {
                text: "pani".to_string(),
                voice: None,
                rate: 1.0,
                pitch: 1.0,
            })
            .expect("speak should succeed");

        eventually(|| !engine.reap(), "Finished speech was never reaped");
        assert!(engine.child.lock().is_none());
    }
}
