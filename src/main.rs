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
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use sunao::clip::ClipId;
use sunao::notice::{Notifier, Terminal};
use sunao::player::Outcome;
use sunao::practice::{self, Session};
use sunao::sequencer::{self, Sequencer};
use sunao::{audio, config, speech, verify};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A pronunciation clip player for vocabulary practice."
)]
struct Cli {
    /// The path to the player config. Defaults are used when not given.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the voices of the configured speech engine.
    Voices {},
    /// Plays a single clip, speaking it if the clip is missing.
    Play {
        /// The clip to play, relative to the resource root.
        clip: String,
    },
    /// Plays every clip of a vocabulary category in order.
    Sequence {
        /// The vocabulary category.
        category: String,
        /// The pause between clips. Overrides the configured delay.
        #[arg(short, long)]
        delay: Option<String>,
    },
    /// Quizzes you on the meaning of each word.
    Practice {
        /// The vocabulary category. All categories are used when not given.
        category: Option<String>,
        /// Practice the words in random order.
        #[arg(short, long)]
        shuffle: bool,
    },
    /// Checks that every vocabulary clip exists and explains where missing ones go.
    Clips {},
    /// Starts the player, controlled from the keyboard.
    Start {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let player_config = match cli.config.as_ref() {
        Some(path) => config::Player::deserialize(path)?,
        None => config::Player::default(),
    };
    let notifier: Arc<dyn Notifier> = Arc::new(Terminal::new());

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Voices {} => {
            let speech_config = player_config.speech();
            let Some(engine) = speech::get_engine(&speech_config) else {
                println!("No speech engine available.");
                return Ok(());
            };

            let voices = engine.voices();
            if voices.is_empty() {
                println!("No voices found.");
                return Ok(());
            }

            println!("Voices:");
            for voice in voices.iter() {
                println!("- {}", voice);
            }
            match speech::select_voice(&voices, &speech_config.language()) {
                Some(voice) => println!("\nMissing clips will be spoken by {}.", voice),
                None => println!("\nMissing clips will be spoken by the default voice."),
            }
        }
        Commands::Play { clip } => {
            let player = config::init_player(&player_config, notifier)?;
            match player.play(&ClipId::from(clip)).outcome().await {
                Outcome::Playing(run) => {
                    run.finished().await;
                }
                Outcome::Fallback => tokio::time::sleep(sequencer::FALLBACK_ALLOWANCE).await,
                Outcome::Superseded => {}
            }
        }
        Commands::Sequence { category, delay } => {
            let vocabulary = config::load_vocabulary(&player_config.vocabulary())?;
            let Some(items) = vocabulary.category(&category) else {
                return Err(format!("no vocabulary category named {}", category).into());
            };
            let delay = match delay {
                Some(delay) => duration_string::DurationString::from_string(delay)?.into(),
                None => player_config.sequence_delay()?,
            };

            let player = config::init_player(&player_config, notifier)?;
            let ids = items.iter().map(|item| item.clip().clone()).collect();
            Sequencer::new(player).play_sequence(ids, delay).join().await;
        }
        Commands::Practice { category, shuffle } => {
            let vocabulary = config::load_vocabulary(&player_config.vocabulary())?;
            let items = match category {
                Some(category) => match vocabulary.category(&category) {
                    Some(items) => items.to_vec(),
                    None => {
                        return Err(format!("no vocabulary category named {}", category).into())
                    }
                },
                None => vocabulary.items().cloned().collect(),
            };
            let practice_config = player_config.practice();
            let items = if shuffle || practice_config.shuffle() {
                practice::shuffled(&items)
            } else {
                items
            };

            let player = config::init_player(&player_config, notifier.clone())?;
            Session::new(player, notifier)
                .with_delays(
                    practice_config.prompt_delay()?,
                    practice_config.advance_delay()?,
                )
                .start(&items)
                .await;
        }
        Commands::Clips {} => {
            let vocabulary = config::load_vocabulary(&player_config.vocabulary())?;
            let root = player_config.resource_root();
            let report = verify::check_clips(&vocabulary, &root);
            verify::print_report(&report, &vocabulary);
            println!(
                "\n{}",
                verify::download_instructions(&root, &verify::missing_clips(&vocabulary, &root))
            );
            if report.has_errors() {
                return Err("clip verification found errors".into());
            }
        }
        Commands::Start {} => {
            config::init_player_and_controller(&player_config, notifier)?
                .join()
                .await?;
        }
    }

    Ok(())
}
