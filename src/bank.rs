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

//! Sample banks.
//!
//! A bank maps each playable pitch to a three-phase sample. Banks are built
//! entirely at load time and are read-only afterwards, so they can be shared
//! freely between the control and render contexts without locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::pitch::Pitch;

pub mod loader;

/// The decoded PCM for one pitch: attack, looping sustain, and decay phases.
///
/// All three buffers are mono f32 frames at the same sample rate. A buffer
/// may be empty, in which case its phase completes instantly during playback.
pub struct Sample {
    /// The pitch this sample sounds.
    pitch: Pitch,
    /// Sample rate shared by all three phase buffers.
    sample_rate: u32,
    attack: Vec<f32>,
    sustain: Vec<f32>,
    decay: Vec<f32>,
}

impl Sample {
    /// Creates a sample from fully decoded phase buffers.
    pub fn new(
        pitch: Pitch,
        sample_rate: u32,
        attack: Vec<f32>,
        sustain: Vec<f32>,
        decay: Vec<f32>,
    ) -> Sample {
        Sample {
            pitch,
            sample_rate,
            attack,
            sustain,
            decay,
        }
    }

    /// The pitch this sample belongs to.
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// The sample rate of the phase buffers.
    #[allow(dead_code)]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The attack phase frames.
    pub fn attack(&self) -> &[f32] {
        &self.attack
    }

    /// The sustain phase frames. Loops while a note is held.
    pub fn sustain(&self) -> &[f32] {
        &self.sustain
    }

    /// The decay phase frames.
    pub fn decay(&self) -> &[f32] {
        &self.decay
    }

    /// Returns the memory size of the PCM data in bytes.
    pub fn memory_size(&self) -> usize {
        (self.attack.len() + self.sustain.len() + self.decay.len()) * std::mem::size_of::<f32>()
    }
}

impl std::fmt::Debug for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("pitch", &self.pitch.to_string())
            .field("sample_rate", &self.sample_rate)
            .field("attack_frames", &self.attack.len())
            .field("sustain_frames", &self.sustain.len())
            .field("decay_frames", &self.decay.len())
            .finish()
    }
}

/// A named, read-only collection of samples keyed by pitch.
pub struct Bank {
    name: String,
    samples: HashMap<Pitch, Arc<Sample>>,
}

impl Bank {
    /// Creates an empty bank.
    pub fn new(name: impl Into<String>) -> Bank {
        Bank {
            name: name.into(),
            samples: HashMap::new(),
        }
    }

    /// The name of this bank.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a sample, keyed by the sample's own pitch. Adding a second sample
    /// for the same pitch replaces the first.
    pub fn add(&mut self, sample: Sample) {
        self.samples.insert(sample.pitch(), Arc::new(sample));
    }

    /// Looks up the sample for a pitch. Pitches with no sample simply do not
    /// sound; callers treat None as a no-op, not an error.
    pub fn lookup(&self, pitch: Pitch) -> Option<Arc<Sample>> {
        self.samples.get(&pitch).cloned()
    }

    /// The number of pitches with samples in this bank.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the bank contains no samples.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The mapped pitches in ascending frequency order.
    pub fn pitches(&self) -> Vec<Pitch> {
        let mut pitches: Vec<Pitch> = self.samples.keys().copied().collect();
        pitches.sort();
        pitches
    }

    /// Returns the total memory used by the bank's PCM data in bytes.
    pub fn memory_size(&self) -> usize {
        self.samples.values().map(|sample| sample.memory_size()).sum()
    }
}

impl std::fmt::Debug for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank")
            .field("name", &self.name)
            .field("samples", &self.samples.len())
            .field("memory_kb", &(self.memory_size() / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::Note;

    fn sample_with_attack(pitch: Pitch, attack: Vec<f32>) -> Sample {
        Sample::new(pitch, 44100, attack, vec![], vec![])
    }

    #[test]
    fn test_lookup_missing_pitch() {
        let bank = Bank::new("empty");
        assert!(bank.lookup(Pitch::new(Note::C, 4)).is_none());
        assert!(bank.is_empty());
    }

    #[test]
    fn test_add_and_lookup() {
        let pitch = Pitch::new(Note::A, 4);
        let mut bank = Bank::new("test");
        bank.add(sample_with_attack(pitch, vec![0.1, 0.2]));

        let sample = bank.lookup(pitch).expect("sample should be present");
        assert_eq!(sample.pitch(), pitch);
        assert_eq!(sample.attack(), &[0.1, 0.2]);
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn test_add_replaces_existing_entry() {
        let pitch = Pitch::new(Note::A, 4);
        let mut bank = Bank::new("test");
        bank.add(sample_with_attack(pitch, vec![0.1]));
        bank.add(sample_with_attack(pitch, vec![0.9]));

        assert_eq!(bank.len(), 1);
        let sample = bank.lookup(pitch).expect("sample should be present");
        assert_eq!(sample.attack(), &[0.9]);
    }

    #[test]
    fn test_pitches_sorted_by_frequency() {
        let mut bank = Bank::new("test");
        bank.add(sample_with_attack(Pitch::new(Note::C, 5), vec![]));
        bank.add(sample_with_attack(Pitch::new(Note::C, 4), vec![]));
        bank.add(sample_with_attack(Pitch::new(Note::A, 4), vec![]));

        assert_eq!(
            bank.pitches(),
            vec![
                Pitch::new(Note::C, 4),
                Pitch::new(Note::A, 4),
                Pitch::new(Note::C, 5),
            ]
        );
    }
}
