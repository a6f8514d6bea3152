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

//! Plays pronunciation clips for vocabulary practice, speaking words whose clips are
//! missing.

pub mod audio;
pub mod cache;
pub mod clip;
pub mod config;
pub mod controller;
pub mod notice;
pub mod player;
pub mod playsync;
pub mod practice;
pub mod sequencer;
pub mod speech;
pub mod verify;
pub mod vocabulary;
#[cfg(test)]
mod testutil;
