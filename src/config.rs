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

//! Instrument configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default sample rate for the engine and output stream.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Typed error for config load/parse failures so callers can distinguish
/// e.g. file-not-found from parse errors without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),
}

/// The instrument configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    /// The MIDI input device to listen on. None picks the first available.
    midi_device: Option<String>,

    /// Audio output configuration.
    #[serde(default)]
    audio: Audio,

    /// The path to the bank repository.
    banks: PathBuf,

    /// The bank to activate at startup. None picks the first by name.
    bank: Option<String>,

    /// Play each note's sustain phase once instead of looping it.
    #[serde(default)]
    single_loop: bool,
}

/// Audio output configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Audio {
    /// The output device name. None picks the default output device.
    device: Option<String>,

    /// The sample rate banks are resampled to and the stream runs at.
    #[serde(default = "default_sample_rate")]
    sample_rate: u32,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for Audio {
    fn default() -> Audio {
        Audio {
            device: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl Config {
    /// Loads configuration from the given file, with KEYWAVE_* environment
    /// variables taking precedence.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        Ok(config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("KEYWAVE"))
            .build()?
            .try_deserialize()?)
    }

    /// Gets the configured MIDI input device name.
    pub fn midi_device(&self) -> Option<&str> {
        self.midi_device.as_deref()
    }

    /// Gets the audio output configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Gets the bank repository path.
    pub fn banks(&self) -> &Path {
        &self.banks
    }

    /// Gets the startup bank name.
    pub fn bank(&self) -> Option<&str> {
        self.bank.as_deref()
    }

    /// Whether sustain phases play once instead of looping.
    pub fn single_loop(&self) -> bool {
        self.single_loop
    }
}

impl Audio {
    /// Creates an audio configuration without a config file.
    #[allow(dead_code)] // Used by tests constructing ad-hoc devices.
    pub fn new(device: Option<String>, sample_rate: u32) -> Audio {
        Audio {
            device,
            sample_rate,
        }
    }

    /// Gets the output device name.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Gets the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
