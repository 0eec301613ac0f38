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

//! The render side of the engine.
//!
//! The renderer is the sole owner of the live voice list. The control side
//! never touches it directly; it enqueues commands on a channel that the
//! renderer drains, without blocking, at the start of every block. This
//! keeps the audio callback free of locks shared with the control context.

use crossbeam_channel::Receiver;

use super::voice::Voice;

/// Preallocated per-voice scratch capacity, in frames. Blocks larger than
/// this grow the scratch buffer once and then stay allocation-free.
const DEFAULT_BLOCK_CAPACITY: usize = 4096;

/// Voice capacity preallocated at startup; one voice per playable pitch.
const VOICE_CAPACITY: usize = 64;

/// A control-side intent applied by the renderer at the next block boundary.
pub enum Command {
    /// Begin playing a new voice.
    Start(Voice),
    /// Drop every live voice immediately, cutting straight to silence.
    StopAll,
}

/// Mixes all live voices into output blocks pulled by the audio device.
pub struct Renderer {
    /// Pending intents from the control side.
    commands: Receiver<Command>,
    /// The live voices. Owned exclusively by the render context.
    voices: Vec<Voice>,
    /// Per-voice scratch block reused across calls.
    scratch: Vec<f32>,
}

impl Renderer {
    /// Creates a renderer draining the given command channel.
    pub fn new(commands: Receiver<Command>) -> Renderer {
        Renderer {
            commands,
            voices: Vec::with_capacity(VOICE_CAPACITY),
            scratch: vec![0.0; DEFAULT_BLOCK_CAPACITY],
        }
    }

    /// Produces exactly one block of mixed mono audio.
    ///
    /// Pending commands are applied first so a press is audible in the same
    /// block it precedes; voices that finished decaying are reaped after
    /// mixing. Silence is a valid block when no voices are live.
    pub fn render(&mut self, block: &mut [f32]) {
        block.fill(0.0);

        for command in self.commands.try_iter() {
            match command {
                Command::Start(voice) => self.voices.push(voice),
                Command::StopAll => self.voices.clear(),
            }
        }

        if self.scratch.len() < block.len() {
            self.scratch.resize(block.len(), 0.0);
        }

        for voice in self.voices.iter_mut() {
            let scratch = &mut self.scratch[..block.len()];
            voice.fill(scratch);
            for (out, sample) in block.iter_mut().zip(scratch.iter()) {
                *out += *sample;
            }
        }

        self.voices.retain(|voice| !voice.is_finished());
    }

    /// The number of live voices, finished-but-unreaped voices included.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("active_voices", &self.active_voices())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::bank::Sample;
    use crate::pitch::{Note, Pitch};

    struct Flags {
        released: Arc<AtomicBool>,
        finished: Arc<AtomicBool>,
    }

    fn make_voice(attack: Vec<f32>, sustain: Vec<f32>, decay: Vec<f32>) -> (Voice, Flags) {
        let sample = Arc::new(Sample::new(
            Pitch::new(Note::A, 4),
            44100,
            attack,
            sustain,
            decay,
        ));
        let flags = Flags {
            released: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
        };
        let voice = Voice::new(
            sample,
            flags.released.clone(),
            flags.finished.clone(),
            false,
        );
        (voice, flags)
    }

    fn render(renderer: &mut Renderer, frames: usize) -> Vec<f32> {
        let mut block = vec![f32::NAN; frames];
        renderer.render(&mut block);
        block
    }

    #[test]
    fn test_no_voices_renders_silence() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let mut renderer = Renderer::new(rx);

        assert_eq!(render(&mut renderer, 4), vec![0.0; 4]);
        renderer.render(&mut []);
        assert_eq!(renderer.active_voices(), 0);
    }

    #[test]
    fn test_started_voice_sounds_in_same_block() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut renderer = Renderer::new(rx);

        let (voice, _flags) = make_voice(vec![0.25, 0.5], vec![1.0], vec![]);
        tx.send(Command::Start(voice)).expect("send");

        assert_eq!(render(&mut renderer, 4), vec![0.25, 0.5, 1.0, 1.0]);
        assert_eq!(renderer.active_voices(), 1);
    }

    #[test]
    fn test_mixing_sums_voices() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut renderer = Renderer::new(rx);

        let (first, _f1) = make_voice(vec![0.25, 0.25], vec![], vec![]);
        let (second, _f2) = make_voice(vec![0.5], vec![], vec![]);
        tx.send(Command::Start(first)).expect("send");
        tx.send(Command::Start(second)).expect("send");

        assert_eq!(render(&mut renderer, 3), vec![0.75, 0.25, 0.0]);
    }

    #[test]
    fn test_mixing_is_registration_order_independent() {
        let blocks: Vec<Vec<f32>> = [false, true]
            .iter()
            .map(|&reversed| {
                let (tx, rx) = crossbeam_channel::unbounded();
                let mut renderer = Renderer::new(rx);

                let (first, _f1) = make_voice(vec![0.3, 0.1], vec![], vec![]);
                let (second, _f2) = make_voice(vec![0.2, 0.7], vec![], vec![]);
                let mut voices = vec![first, second];
                if reversed {
                    voices.reverse();
                }
                for voice in voices {
                    tx.send(Command::Start(voice)).expect("send");
                }
                render(&mut renderer, 2)
            })
            .collect();

        assert_eq!(blocks[0], blocks[1]);
    }

    #[test]
    fn test_finished_voices_are_reaped_after_mixing() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut renderer = Renderer::new(rx);

        let (voice, flags) = make_voice(vec![1.0], vec![], vec![2.0]);
        tx.send(Command::Start(voice)).expect("send");

        // The whole voice fits in one block; it is reaped afterwards and the
        // control side sees the finished flag.
        assert_eq!(render(&mut renderer, 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(renderer.active_voices(), 0);
        assert!(flags.finished.load(Ordering::Relaxed));
    }

    #[test]
    fn test_stop_all_cuts_to_silence() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut renderer = Renderer::new(rx);

        let (voice, _flags) = make_voice(vec![], vec![1.0], vec![]);
        tx.send(Command::Start(voice)).expect("send");
        assert_eq!(render(&mut renderer, 2), vec![1.0, 1.0]);

        tx.send(Command::StopAll).expect("send");
        assert_eq!(render(&mut renderer, 2), vec![0.0, 0.0]);
        assert_eq!(renderer.active_voices(), 0);
    }

    #[test]
    fn test_blocks_larger_than_scratch_capacity() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut renderer = Renderer::new(rx);

        let (voice, _flags) = make_voice(vec![], vec![0.5], vec![]);
        tx.send(Command::Start(voice)).expect("send");

        let block = render(&mut renderer, DEFAULT_BLOCK_CAPACITY * 2);
        assert!(block.iter().all(|sample| *sample == 0.5));
    }
}
