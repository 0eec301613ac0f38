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

//! Musical pitch identification.
//!
//! A pitch is a note class plus an octave; its frequency is always derived
//! from those two, never stored independently, so two pitches constructed
//! through different paths (MIDI number, frequency quantization, semitone
//! arithmetic) compare bit-identically.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};
use std::str::FromStr;

/// The twelve equal-tempered note classes, in chromatic order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Note {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

/// Chromatic ordering used for all note arithmetic. Indexing into this table
/// with modulo arithmetic avoids relying on enum discriminant ordering.
const CHROMATIC: [Note; 12] = [
    Note::C,
    Note::CSharp,
    Note::D,
    Note::DSharp,
    Note::E,
    Note::F,
    Note::FSharp,
    Note::G,
    Note::GSharp,
    Note::A,
    Note::ASharp,
    Note::B,
];

impl Note {
    /// The reference frequency of this note class at octave 4, in Hz.
    pub fn reference(&self) -> f64 {
        match self {
            Note::C => 261.63,
            Note::CSharp => 277.18,
            Note::D => 293.66,
            Note::DSharp => 311.13,
            Note::E => 329.63,
            Note::F => 349.23,
            Note::FSharp => 369.99,
            Note::G => 392.00,
            Note::GSharp => 415.30,
            Note::A => 440.00,
            Note::ASharp => 466.16,
            Note::B => 493.88,
        }
    }

    /// The position of this note class within the chromatic scale (C = 0).
    pub fn position(&self) -> usize {
        match self {
            Note::C => 0,
            Note::CSharp => 1,
            Note::D => 2,
            Note::DSharp => 3,
            Note::E => 4,
            Note::F => 5,
            Note::FSharp => 6,
            Note::G => 7,
            Note::GSharp => 8,
            Note::A => 9,
            Note::ASharp => 10,
            Note::B => 11,
        }
    }

    /// The display name of this note class.
    pub fn name(&self) -> &'static str {
        match self {
            Note::C => "C",
            Note::CSharp => "C#",
            Note::D => "D",
            Note::DSharp => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::FSharp => "F#",
            Note::G => "G",
            Note::GSharp => "G#",
            Note::A => "A",
            Note::ASharp => "A#",
            Note::B => "B",
        }
    }

    /// Parses a note class from its display name.
    pub fn from_name(name: &str) -> Option<Note> {
        CHROMATIC.iter().copied().find(|note| note.name() == name)
    }

    /// Moves the given number of semitones around the chromatic circle,
    /// wrapping in both directions. Octave carry is the caller's concern.
    pub fn transpose(&self, steps: i32) -> Note {
        let index = (self.position() as i32 + steps).rem_euclid(CHROMATIC.len() as i32);
        CHROMATIC[index as usize]
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a pitch string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid pitch: {0}")]
pub struct ParsePitchError(String);

/// A musical pitch: a note class and an octave with a derived frequency.
///
/// Equality, ordering, and hashing are all defined by the derived frequency.
/// The frequency is recomputed whenever the note or octave changes, so it
/// can never diverge from them.
#[derive(Clone, Copy, Debug)]
pub struct Pitch {
    note: Note,
    octave: i32,
    frequency: f64,
}

impl Pitch {
    /// Creates a pitch from a note class and octave.
    pub fn new(note: Note, octave: i32) -> Pitch {
        Pitch {
            note,
            octave,
            frequency: derive_frequency(note, octave),
        }
    }

    /// Creates a pitch from a MIDI note number. Note 69 is A4.
    pub fn from_midi(number: u8) -> Pitch {
        let note = CHROMATIC[(number % 12) as usize];
        let octave = (number / 12) as i32 - 1;
        Pitch::new(note, octave)
    }

    /// Creates the pitch nearest to the given frequency by rounding to the
    /// closest whole semitone distance from A4.
    #[allow(dead_code)]
    pub fn from_frequency(frequency: f64) -> Pitch {
        let semitones_from_a4 = (12.0 * (frequency / Note::A.reference()).log2()).round() as i32;

        // A sits at position 9 in the chromatic scale, so offsetting by 9
        // turns the semitone distance into a C-relative position.
        let from_c4 = semitones_from_a4 + 9;
        let note = CHROMATIC[from_c4.rem_euclid(12) as usize];
        let octave = 4 + from_c4.div_euclid(12);
        Pitch::new(note, octave)
    }

    /// The note class of this pitch.
    pub fn note(&self) -> Note {
        self.note
    }

    /// The octave of this pitch.
    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// The frequency of this pitch in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// The MIDI note number of this pitch.
    #[allow(dead_code)]
    pub fn midi_number(&self) -> i32 {
        (self.octave + 1) * 12 + self.note.position() as i32
    }

    /// Replaces the note class, re-deriving the frequency.
    #[allow(dead_code)]
    pub fn set_note(&mut self, note: Note) {
        self.note = note;
        self.frequency = derive_frequency(self.note, self.octave);
    }

    /// Replaces the octave, re-deriving the frequency.
    #[allow(dead_code)]
    pub fn set_octave(&mut self, octave: i32) {
        self.octave = octave;
        self.frequency = derive_frequency(self.note, self.octave);
    }

    /// Iterates the playable range of the instrument, A2 through C8.
    pub fn playable_range() -> impl Iterator<Item = Pitch> {
        (45..=108).map(Pitch::from_midi)
    }
}

/// Frequency is the octave-4 class reference scaled by octave distance.
fn derive_frequency(note: Note, octave: i32) -> f64 {
    note.reference() * 2.0_f64.powi(octave - 4)
}

impl Add<i32> for Pitch {
    type Output = Pitch;

    fn add(self, semitones: i32) -> Pitch {
        let note = self.note.transpose(semitones);
        let octave_carry = (self.note.position() as i32 + semitones).div_euclid(12);
        Pitch::new(note, self.octave + octave_carry)
    }
}

impl Sub<i32> for Pitch {
    type Output = Pitch;

    fn sub(self, semitones: i32) -> Pitch {
        self + -semitones
    }
}

impl PartialEq for Pitch {
    fn eq(&self, other: &Self) -> bool {
        self.frequency == other.frequency
    }
}

// Derived frequencies are finite and positive, so equality is total.
impl Eq for Pitch {}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.frequency.total_cmp(&other.frequency)
    }
}

impl Hash for Pitch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.frequency.to_bits().hash(state);
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = ParsePitchError;

    /// Parses pitches in the form used by bank manifests, e.g. "C#4" or "A-1".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name_len = if s.get(1..2) == Some("#") { 2 } else { 1 };
        let note = s
            .get(..name_len)
            .and_then(Note::from_name)
            .ok_or_else(|| ParsePitchError(s.to_string()))?;
        let octave = s
            .get(name_len..)
            .and_then(|octave| octave.parse::<i32>().ok())
            .ok_or_else(|| ParsePitchError(s.to_string()))?;

        Ok(Pitch::new(note, octave))
    }
}
