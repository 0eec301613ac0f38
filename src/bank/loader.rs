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

//! Bank loading from disk.
//!
//! A bank is a directory containing a `bank.json` manifest plus one wav file
//! per phase per pitch. Everything is decoded into memory up front so that
//! playback never touches the filesystem; loading failures surface here,
//! before a bank can reach the engine.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info};

use super::{Bank, Sample};
use crate::pitch::{ParsePitchError, Pitch};

/// The manifest file expected in every bank directory.
pub const MANIFEST_FILE: &str = "bank.json";

/// Error loading a bank from disk.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wav decode error: {0}")]
    Wav(#[from] hound::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("manifest error: {0}")]
    InvalidPitch(#[from] ParsePitchError),
}

/// The JSON representation of a bank manifest.
#[derive(Deserialize)]
struct Manifest {
    /// The bank name.
    name: String,
    /// One entry per playable pitch.
    samples: Vec<ManifestSample>,
}

/// One manifest entry: a pitch and its three phase files.
#[derive(Deserialize)]
struct ManifestSample {
    pitch: String,
    attack: String,
    sustain: String,
    decay: String,
}

/// Loads the bank in the given directory, resampling all phase buffers to
/// the target sample rate.
pub fn load_bank(dir: &Path, target_sample_rate: u32) -> Result<Bank, BankError> {
    let manifest: Manifest = serde_json::from_str(&fs::read_to_string(dir.join(MANIFEST_FILE))?)?;

    let mut bank = Bank::new(manifest.name);
    for entry in manifest.samples {
        let pitch: Pitch = entry.pitch.parse()?;
        let attack = load_phase(&dir.join(&entry.attack), target_sample_rate)?;
        let sustain = load_phase(&dir.join(&entry.sustain), target_sample_rate)?;
        let decay = load_phase(&dir.join(&entry.decay), target_sample_rate)?;

        debug!(
            bank = bank.name(),
            pitch = %pitch,
            attack_frames = attack.len(),
            sustain_frames = sustain.len(),
            decay_frames = decay.len(),
            "Sample loaded"
        );
        bank.add(Sample::new(pitch, target_sample_rate, attack, sustain, decay));
    }

    info!(
        bank = bank.name(),
        samples = bank.len(),
        memory_kb = bank.memory_size() / 1024,
        "Bank loaded"
    );
    Ok(bank)
}

/// Scans a bank repository and loads every directory that carries a
/// manifest. Banks that fail to load are reported and skipped; they must
/// not reach the engine partially decoded.
pub fn read_banks(
    root: &Path,
    target_sample_rate: u32,
) -> Result<HashMap<String, Arc<Bank>>, BankError> {
    let mut banks = HashMap::new();

    for dir_entry in fs::read_dir(root)? {
        let path = dir_entry?.path();
        if !path.is_dir() || !path.join(MANIFEST_FILE).is_file() {
            continue;
        }

        match load_bank(&path, target_sample_rate) {
            Ok(bank) => {
                banks.insert(bank.name().to_string(), Arc::new(bank));
            }
            Err(e) => {
                error!(path = ?path, error = %e, "Error while loading bank");
            }
        }
    }

    Ok(banks)
}

/// Decodes one phase wav into mono f32 frames at the target rate.
fn load_phase(path: &Path, target_sample_rate: u32) -> Result<Vec<f32>, BankError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, hound::Error>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|sample| sample as f32 / scale))
                .collect::<Result<Vec<f32>, hound::Error>>()?
        }
    };

    let mono = downmix(&interleaved, spec.channels);
    if spec.sample_rate == target_sample_rate {
        Ok(mono)
    } else {
        Ok(resample(&mono, spec.sample_rate, target_sample_rate))
    }
}

/// Averages interleaved channels down to mono.
fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resamples mono frames with linear interpolation. Sufficient quality for
/// pre-pitched instrument samples; avoids carrying a resampler dependency.
fn resample(frames: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if frames.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let target_frames = (frames.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_frames);

    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        let s0 = frames.get(source_frame).copied().unwrap_or(0.0);
        let s1 = frames.get(source_frame + 1).copied().unwrap_or(s0);
        output.push(s0 + (s1 - s0) * frac);
    }

    output
}
