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
    sync::Arc,
    thread,
    time::{Duration, SystemTime},
};

use crate::{
    audio,
    notice::mock::Notifier,
    player::Player,
    speech::{self, mock::Engine, Fallback, Language},
};

/// Wait for the given predicate to return true or fail.
#[inline]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = SystemTime::now();
    let mut tick = Duration::from_millis(5);
    let timeout = Duration::from_secs(10);
    let max_tick = Duration::from_millis(100);

    loop {
        let elapsed = start.elapsed();
        if elapsed.is_err() {
            panic!("System time error");
        }
        let elapsed = elapsed.unwrap();

        if elapsed > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }

        thread::sleep(tick);
        tick = std::cmp::min(tick * 2, max_tick);
    }
}

/// Everything a player test needs to look at.
pub struct Harness {
    pub engine: Arc<Engine>,
    pub notifier: Arc<Notifier>,
    pub player: Arc<Player>,
}

/// Builds a player on top of the given mock device with a mock speech engine that has an
/// Urdu voice.
pub fn harness(device: audio::mock::Device) -> Harness {
    let engine = Arc::new(Engine::new(vec![
        speech::Voice::new("ur-PK", "Urdu (Pakistan)"),
        speech::Voice::new("en-US", "English (America)"),
    ]));
    let notifier = Arc::new(Notifier::new(Vec::new()));
    let engine_dyn: Arc<dyn speech::Engine> = engine.clone();
    let fallback = Fallback::new(
        Some(engine_dyn),
        notifier.clone(),
        Language::default(),
        speech::DEFAULT_RATE,
    );
    let player = Arc::new(Player::new(
        Arc::new(device),
        &std::path::PathBuf::from("assets/audio"),
        Arc::new(fallback),
    ));

    Harness {
        engine,
        notifier,
        player,
    }
}
