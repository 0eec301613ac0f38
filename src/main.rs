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
mod audio;
mod bank;
mod config;
mod engine;
mod event;
mod midi;
mod pitch;
mod player;
mod playsync;
#[cfg(test)]
mod test;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};

use crate::bank::loader;
use crate::config::Config;
use crate::engine::Sampler;
use crate::pitch::Pitch;
use crate::player::Player;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sample-based instrument player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the banks in the given bank repository.
    Banks {
        /// The path to the bank repository on disk.
        path: String,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input devices.
    MidiDevices {},
    /// Starts the instrument.
    Start {
        /// The path to the instrument configuration file.
        config_path: String,
        /// The bank to activate, overriding the configured one.
        #[arg(short, long)]
        bank: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Banks { path } => {
            let banks = loader::read_banks(&PathBuf::from(path), config::DEFAULT_SAMPLE_RATE)?;

            if banks.is_empty() {
                println!("No banks found.");
                return Ok(());
            }

            let mut names: Vec<&String> = banks.keys().collect();
            names.sort();

            let playable = Pitch::playable_range().count();
            println!("Banks:");
            for name in names {
                let bank = &banks[name];
                let pitches = bank.pitches();
                let covered = Pitch::playable_range()
                    .filter(|pitch| bank.lookup(*pitch).is_some())
                    .count();
                match (pitches.first(), pitches.last()) {
                    (Some(lowest), Some(highest)) => println!(
                        "- {} ({} to {}, covers {}/{} playable pitches)",
                        name, lowest, highest, covered, playable
                    ),
                    _ => println!("- {} (empty)", name),
                }
            }
        }
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
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Start { config_path, bank } => {
            let config = Config::load(Path::new(&config_path))?;
            let sample_rate = config.audio().sample_rate();

            let banks = loader::read_banks(config.banks(), sample_rate)?;
            let bank = match bank.as_deref().or(config.bank()) {
                Some(name) => banks
                    .get(name)
                    .cloned()
                    .ok_or_else(|| format!("no bank named {}", name))?,
                None => {
                    let mut names: Vec<&String> = banks.keys().collect();
                    names.sort();
                    match names.first() {
                        Some(name) => banks[*name].clone(),
                        None => return Err("no banks found in repository".into()),
                    }
                }
            };

            let (sampler, renderer) = Sampler::new(bank, config.single_loop());
            let audio_device = audio::get_device(config.audio())?;
            let midi_device = midi::get_device(config.midi_device())?;

            Player::new(Arc::new(sampler), renderer, audio_device, midi_device)
                .run()
                .await?;
        }
    }

    Ok(())
}
