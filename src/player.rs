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

//! Ties the engine to the configured devices and runs the event loop.

use std::{error::Error, sync::Arc};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::audio;
use crate::engine::{Renderer, Sampler};
use crate::event::{Event, EventHandler, EventLogger};
use crate::midi;
use crate::playsync::CancelHandle;

/// Capacity of the MIDI event channel between the device callback and the
/// dispatch loop.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Plays the sampler through the audio device, driven by MIDI key events.
pub struct Player {
    /// The polyphony manager. Also registered as an event handler.
    sampler: Arc<Sampler>,
    /// The renderer, held until the audio device takes ownership of it.
    renderer: Option<Renderer>,
    /// The device to play audio through.
    audio_device: Arc<dyn audio::Device>,
    /// The device key events arrive from.
    midi_device: Arc<dyn midi::Device>,
    /// Handlers invoked, in order, for every key event.
    handlers: Vec<Arc<dyn EventHandler>>,
    /// Cancels the audio output thread at shutdown.
    cancel_handle: CancelHandle,
}

impl Player {
    /// Creates a new player. The sampler is registered as an event handler
    /// behind a logger, matching the order events should appear in logs.
    pub fn new(
        sampler: Arc<Sampler>,
        renderer: Renderer,
        audio_device: Arc<dyn audio::Device>,
        midi_device: Arc<dyn midi::Device>,
    ) -> Player {
        let handlers: Vec<Arc<dyn EventHandler>> =
            vec![Arc::new(EventLogger), sampler.clone()];
        Player {
            sampler,
            renderer: Some(renderer),
            audio_device,
            midi_device,
            handlers,
            cancel_handle: CancelHandle::new(),
        }
    }

    /// Registers an additional event handler.
    #[allow(dead_code)]
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Runs the instrument until interrupted or the MIDI stream closes.
    pub async fn run(mut self) -> Result<(), Box<dyn Error>> {
        let renderer = self
            .renderer
            .take()
            .ok_or("player has already been run")?;
        self.audio_device
            .start(renderer, self.cancel_handle.clone())?;

        let (sender, mut receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.midi_device.watch_events(sender)?;

        info!(
            bank = self.sampler.bank_name(),
            audio_device = self.audio_device.name(),
            midi_device = self.midi_device.name(),
            "Instrument ready."
        );

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Interrupt received, shutting down.");
                    break;
                }
                event = receiver.recv() => match event {
                    Some(event) => self.dispatch(&event),
                    None => {
                        warn!("MIDI event stream closed.");
                        break;
                    }
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Dispatches one event to every registered handler.
    fn dispatch(&self, event: &Event) {
        for handler in &self.handlers {
            handler.handle_event(event);
        }
    }

    fn shutdown(&self) {
        self.sampler.stop_all();
        self.midi_device.stop_watch_events();
        self.cancel_handle.cancel();
        info!("Shutdown complete.");
    }
}
