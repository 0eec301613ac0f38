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

//! A voice is one sounding note: a cursor walking the three phase buffers
//! of a sample.
//!
//! Voices live on the render side. The only control-side input after
//! creation is the released flag, which is observed at block boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bank::Sample;

/// The playback phase of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Playing the attack buffer.
    Attacking,
    /// Looping the sustain buffer until the note is released.
    Sustaining,
    /// Playing the decay buffer to its end.
    Decaying,
    /// Inert; produces silence and is eligible for reaping.
    Finished,
}

/// One active note, owning its playback position.
pub struct Voice {
    /// The sample being played. Shared read-only with the bank.
    sample: Arc<Sample>,
    phase: Phase,
    /// Frame index into the current phase's buffer.
    cursor: usize,
    /// Set once by the control side when the note is released.
    released: Arc<AtomicBool>,
    /// Set by this voice when it reaches Finished; read by the control side.
    finished: Arc<AtomicBool>,
    /// Play the sustain phase once instead of looping it.
    sustain_once: bool,
}

impl Voice {
    /// Creates a voice in the Attacking phase.
    pub fn new(
        sample: Arc<Sample>,
        released: Arc<AtomicBool>,
        finished: Arc<AtomicBool>,
        sustain_once: bool,
    ) -> Voice {
        Voice {
            sample,
            phase: Phase::Attacking,
            cursor: 0,
            released,
            finished,
            sustain_once,
        }
    }

    /// Fills the block with the next frames of this voice, crossing phase
    /// boundaries as needed and padding with silence once Finished.
    ///
    /// The released flag is observed exactly once, here at the block
    /// boundary; a release that arrives mid-block takes effect on the next
    /// block. This path never blocks and never allocates.
    pub fn fill(&mut self, block: &mut [f32]) {
        if self.phase == Phase::Sustaining && self.released.load(Ordering::Relaxed) {
            self.phase = Phase::Decaying;
            self.cursor = 0;
        }

        let mut filled = 0;
        while filled < block.len() && self.phase != Phase::Finished {
            let buffer = self.phase_buffer();
            let buffer_len = buffer.len();

            // An exhausted (or empty) buffer advances the phase with zero
            // frames consumed. At most three advances reach Finished, so
            // this loop is bounded even for fully empty samples.
            if self.cursor >= buffer_len {
                self.advance_phase();
                continue;
            }

            let take = (block.len() - filled).min(buffer_len - self.cursor);
            block[filled..filled + take]
                .copy_from_slice(&buffer[self.cursor..self.cursor + take]);
            self.cursor += take;
            filled += take;

            if self.cursor >= buffer_len {
                if self.phase == Phase::Sustaining && !self.sustain_once {
                    // The held-note loop. Release is not checked here.
                    self.cursor = 0;
                } else {
                    self.advance_phase();
                }
            }
        }

        block[filled..].fill(0.0);
    }

    /// Whether this voice has finished decaying and may be reaped.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    fn phase_buffer(&self) -> &[f32] {
        match self.phase {
            Phase::Attacking => self.sample.attack(),
            Phase::Sustaining => self.sample.sustain(),
            Phase::Decaying => self.sample.decay(),
            Phase::Finished => &[],
        }
    }

    fn advance_phase(&mut self) {
        self.cursor = 0;
        self.phase = match self.phase {
            Phase::Attacking => Phase::Sustaining,
            Phase::Sustaining => Phase::Decaying,
            Phase::Decaying | Phase::Finished => Phase::Finished,
        };
        if self.phase == Phase::Finished {
            self.finished.store(true, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("pitch", &self.sample.pitch().to_string())
            .field("phase", &self.phase)
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Note, Pitch};

    fn make_voice(
        attack: Vec<f32>,
        sustain: Vec<f32>,
        decay: Vec<f32>,
    ) -> (Voice, Arc<AtomicBool>, Arc<AtomicBool>) {
        let sample = Arc::new(Sample::new(
            Pitch::new(Note::A, 4),
            44100,
            attack,
            sustain,
            decay,
        ));
        let released = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let voice = Voice::new(sample, released.clone(), finished.clone(), false);
        (voice, released, finished)
    }

    fn fill(voice: &mut Voice, frames: usize) -> Vec<f32> {
        let mut block = vec![f32::NAN; frames];
        voice.fill(&mut block);
        block
    }

    #[test]
    fn test_phase_boundary_mid_block() {
        let (mut voice, released, finished) =
            make_voice(vec![1.0, 2.0, 3.0], vec![10.0, 20.0], vec![-1.0]);

        // Attack runs out after three frames; sustain begins mid-block.
        assert_eq!(fill(&mut voice, 4), vec![1.0, 2.0, 3.0, 10.0]);
        assert_eq!(voice.phase(), Phase::Sustaining);

        // Sustain loops while the note is held.
        assert_eq!(fill(&mut voice, 4), vec![20.0, 10.0, 20.0, 10.0]);
        assert_eq!(voice.phase(), Phase::Sustaining);

        // Release is observed at the start of the next block: decay plays,
        // then silence pads out the block.
        released.store(true, Ordering::Relaxed);
        assert_eq!(fill(&mut voice, 4), vec![-1.0, 0.0, 0.0, 0.0]);
        assert_eq!(voice.phase(), Phase::Finished);
        assert!(finished.load(Ordering::Relaxed));
        assert!(voice.is_finished());
    }

    #[test]
    fn test_finished_voice_emits_silence() {
        let (mut voice, released, _) = make_voice(vec![], vec![0.5], vec![]);
        released.store(true, Ordering::Relaxed);

        // Empty attack skips straight to sustain.
        assert_eq!(fill(&mut voice, 2), vec![0.5, 0.5]);

        // Release observed, empty decay completes instantly.
        assert_eq!(fill(&mut voice, 3), vec![0.0, 0.0, 0.0]);
        assert!(voice.is_finished());
        assert_eq!(fill(&mut voice, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn test_empty_attack_never_sounds() {
        let (mut voice, _, _) = make_voice(vec![], vec![7.0], vec![]);
        assert_eq!(fill(&mut voice, 3), vec![7.0, 7.0, 7.0]);
        assert_eq!(voice.phase(), Phase::Sustaining);
    }

    #[test]
    fn test_all_buffers_empty_finishes_immediately() {
        let (mut voice, _, finished) = make_voice(vec![], vec![], vec![]);
        assert_eq!(fill(&mut voice, 4), vec![0.0, 0.0, 0.0, 0.0]);
        assert!(voice.is_finished());
        assert!(finished.load(Ordering::Relaxed));
    }

    #[test]
    fn test_empty_sustain_decays_without_release() {
        // With nothing to sustain, the voice falls through to decay.
        let (mut voice, _, _) = make_voice(vec![1.0], vec![], vec![2.0, 3.0]);
        assert_eq!(fill(&mut voice, 4), vec![1.0, 2.0, 3.0, 0.0]);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_release_mid_block_takes_effect_next_block() {
        let (mut voice, released, _) = make_voice(vec![], vec![1.0, 2.0], vec![9.0]);

        assert_eq!(fill(&mut voice, 2), vec![1.0, 2.0]);

        // The flag is set while no block is being filled; the sustain loop
        // still finishes the current pass on the next block boundary check.
        released.store(true, Ordering::Relaxed);
        assert_eq!(fill(&mut voice, 2), vec![9.0, 0.0]);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_release_during_attack_completes_attack_first() {
        let (mut voice, released, _) = make_voice(vec![1.0, 2.0, 3.0], vec![5.0], vec![8.0]);
        released.store(true, Ordering::Relaxed);

        // Release does not truncate the attack; the remainder of the block
        // sustains, and decay starts at the next block boundary.
        assert_eq!(fill(&mut voice, 4), vec![1.0, 2.0, 3.0, 5.0]);
        assert_eq!(voice.phase(), Phase::Sustaining);
        assert_eq!(fill(&mut voice, 2), vec![8.0, 0.0]);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_sustain_once_decays_after_one_pass() {
        let sample = Arc::new(Sample::new(
            Pitch::new(Note::A, 4),
            44100,
            vec![1.0],
            vec![2.0, 3.0],
            vec![4.0],
        ));
        let mut voice = Voice::new(
            sample,
            Arc::new(AtomicBool::new(false)),
            Arc::new(AtomicBool::new(false)),
            true,
        );

        let mut block = vec![f32::NAN; 6];
        voice.fill(&mut block);
        assert_eq!(block, vec![1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_zero_length_block() {
        let (mut voice, _, _) = make_voice(vec![1.0], vec![2.0], vec![3.0]);
        voice.fill(&mut []);
        assert_eq!(voice.phase(), Phase::Attacking);
    }
}
