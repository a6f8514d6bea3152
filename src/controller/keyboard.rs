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

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;
use crate::clip::ClipId;
use crate::config;

/// The lines that trigger the non-play events.
#[derive(Clone, Debug)]
struct Keys {
    replay: String,
    stop: String,
    sequence: String,
}

/// A controller that controls a player using the keyboard. Anything that isn't a key
/// binding is played as a clip.
pub struct Driver {
    keys: Keys,
}

impl Driver {
    pub fn new(config: &config::Keyboard) -> Driver {
        Driver {
            keys: Keys {
                replay: config.replay().to_string(),
                stop: config.stop().to_string(),
                sequence: config.sequence().to_string(),
            },
        }
    }

    fn parse(keys: &Keys, input: &str) -> Option<Event> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if input == keys.replay {
            return Some(Event::Replay);
        }
        if input == keys.stop {
            return Some(Event::Stop);
        }
        if input == keys.sequence {
            warn!("A sequence needs a vocabulary category");
            return None;
        }
        if let Some(category) = input
            .strip_prefix(keys.sequence.as_str())
            .and_then(|rest| rest.strip_prefix(char::is_whitespace))
        {
            return Some(Event::Sequence(category.trim().to_string()));
        }
        Some(Event::Play(ClipId::from(input)))
    }

    /// Reads one line and sends the event it stands for. Returns false once the input is
    /// exhausted.
    fn monitor_io<R, W>(
        keys: &Keys,
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Clip to play ({} replay, {} stop, {} <category>): ",
            keys.replay, keys.stop, keys.sequence,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        if let Some(event) = Self::parse(keys, &input) {
            events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        }
        Ok(true)
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let keys = self.keys.clone();
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&keys, &events_tx, io::stdin().lock(), io::stdout())? {}
            info!("Keyboard input closed.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader};

    use tokio::sync::mpsc;

    use crate::clip::ClipId;
    use crate::config;
    use crate::controller::Event;

    use super::Driver;

    fn get_event(driver: &Driver, input: &str) -> Result<Option<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(input.as_bytes());
        let mut writer: Vec<u8> = Vec::new();
        assert!(Driver::monitor_io(&driver.keys, &sender, reader, &mut writer)?);

        // Force the sender to close.
        drop(sender);
        Ok(receiver.blocking_recv())
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        let driver = Driver::new(&config::Keyboard::default());
        assert_eq!(Some(Event::Replay), get_event(&driver, "r\n")?);
        assert_eq!(Some(Event::Stop), get_event(&driver, " s \n")?);
        assert_eq!(
            Some(Event::Sequence("basics".to_string())),
            get_event(&driver, "seq basics\n")?
        );
        assert_eq!(
            Some(Event::Play(ClipId::from("pani.mp3"))),
            get_event(&driver, "pani.mp3\n")?
        );
        assert_eq!(
            Some(Event::Play(ClipId::from("sequel.mp3"))),
            get_event(&driver, "sequel.mp3\n")?
        );
        assert_eq!(None, get_event(&driver, "seq\n")?);
        assert_eq!(None, get_event(&driver, "\n")?);
        Ok(())
    }

    #[test]
    fn test_end_of_input() -> Result<(), io::Error> {
        let driver = Driver::new(&config::Keyboard::default());
        let (sender, _receiver) = mpsc::channel::<Event>(1);
        let mut writer: Vec<u8> = Vec::new();
        assert!(!Driver::monitor_io(
            &driver.keys,
            &sender,
            BufReader::new("".as_bytes()),
            &mut writer
        )?);
        Ok(())
    }
}
