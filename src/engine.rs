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

//! The realtime playback engine.
//!
//! This module provides:
//! - Per-voice attack/sustain/decay playback (`voice`)
//! - Block mixing on the audio render context (`renderer`)
//! - The control-side polyphony manager (`Sampler`)
//!
//! The two halves communicate over a command channel plus two atomic flags
//! per voice, so the render path never contends on a control-side lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::bank::Bank;
use crate::event::{Event, EventHandler};
use crate::pitch::Pitch;

mod renderer;
mod voice;

pub use renderer::Renderer;

use renderer::Command;
use voice::Voice;

/// The control side's view of a voice it has started.
struct VoiceHandle {
    /// Set exactly once on release; observed by the voice at block starts.
    released: Arc<AtomicBool>,
    /// Set by the render side once the voice finishes decaying.
    finished: Arc<AtomicBool>,
}

impl VoiceHandle {
    fn new() -> VoiceHandle {
        VoiceHandle {
            released: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Maps pitches to live voices and routes press/release events to them.
///
/// At most one voice sounds per pitch. A pitch stays claimed until its voice
/// has fully rendered its decay, so a press arriving during the decay of a
/// released note is ignored rather than truncating it.
pub struct Sampler {
    /// The active bank. Swapped atomically; in-flight voices keep playing
    /// samples from the bank they were started against.
    bank: RwLock<Arc<Bank>>,
    /// Pitch to voice handles. Control context only.
    voices: Mutex<HashMap<Pitch, VoiceHandle>>,
    /// Intents for the renderer.
    commands: Sender<Command>,
    /// Play each voice's sustain phase once instead of looping it.
    sustain_once: bool,
}

impl Sampler {
    /// Creates a sampler and the renderer that serves its voices. The
    /// renderer is handed to the audio device; the sampler stays with the
    /// control context.
    pub fn new(bank: Arc<Bank>, sustain_once: bool) -> (Sampler, Renderer) {
        let (commands, receiver) = crossbeam_channel::unbounded();
        let sampler = Sampler {
            bank: RwLock::new(bank),
            voices: Mutex::new(HashMap::new()),
            commands,
            sustain_once,
        };
        (sampler, Renderer::new(receiver))
    }

    /// Starts a voice for the pitch, unless one is already sounding or the
    /// active bank has no sample for it. Both cases are quiet no-ops.
    pub fn press(&self, pitch: Pitch) {
        let mut voices = self.voices.lock();
        voices.retain(|_, handle| !handle.finished.load(Ordering::Relaxed));

        if voices.contains_key(&pitch) {
            debug!(pitch = %pitch, "Pitch already sounding, press ignored");
            return;
        }

        let sample = match self.bank.read().lookup(pitch) {
            Some(sample) => sample,
            None => {
                debug!(pitch = %pitch, "No sample for pitch");
                return;
            }
        };

        let handle = VoiceHandle::new();
        let voice = Voice::new(
            sample,
            handle.released.clone(),
            handle.finished.clone(),
            self.sustain_once,
        );
        if self.commands.send(Command::Start(voice)).is_err() {
            warn!(pitch = %pitch, "Renderer is gone, dropping press");
            return;
        }

        voices.insert(pitch, handle);
        debug!(pitch = %pitch, "Voice started");
    }

    /// Signals the voice for the pitch, if any, to begin its decay. The
    /// voice keeps producing audio until the decay completes.
    pub fn release(&self, pitch: Pitch) {
        match self.voices.lock().get(&pitch) {
            Some(handle) => {
                handle.released.store(true, Ordering::Relaxed);
                debug!(pitch = %pitch, "Voice released");
            }
            None => debug!(pitch = %pitch, "Release for silent pitch ignored"),
        }
    }

    /// Stops all playback abruptly: every voice is dropped at the next
    /// block boundary and the pitch table is cleared.
    pub fn stop_all(&self) {
        let mut voices = self.voices.lock();
        for handle in voices.values() {
            handle.released.store(true, Ordering::Relaxed);
        }
        let stopped = voices.len();
        voices.clear();

        if self.commands.send(Command::StopAll).is_err() {
            warn!("Renderer is gone, nothing to stop");
            return;
        }

        if stopped > 0 {
            info!(stopped, "All voices stopped");
        }
    }

    /// Swaps the active bank. Voices already sounding are unaffected; they
    /// hold direct references to their samples.
    #[allow(dead_code)] // Bank switching is not yet surfaced in the CLI.
    pub fn set_bank(&self, bank: Arc<Bank>) {
        info!(bank = bank.name(), "Bank activated");
        *self.bank.write() = bank;
    }

    /// The name of the active bank.
    pub fn bank_name(&self) -> String {
        self.bank.read().name().to_string()
    }

    /// The number of pitches with a live (possibly still decaying) voice.
    pub fn active_voices(&self) -> usize {
        self.voices
            .lock()
            .values()
            .filter(|handle| !handle.finished.load(Ordering::Relaxed))
            .count()
    }
}

impl EventHandler for Sampler {
    // Velocity is accepted but intentionally unused: samples play back at
    // their recorded level.
    fn handle_event(&self, event: &Event) {
        match event {
            Event::Press { pitch, .. } => self.press(*pitch),
            Event::Release { pitch, .. } => self.release(*pitch),
        }
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("bank", &self.bank.read().name())
            .field("active_voices", &self.active_voices())
            .finish()
    }
}
