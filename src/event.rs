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

//! Key events decoded from MIDI input.

use std::fmt;

use midly::{live::LiveEvent, MidiMessage};
use tracing::info;

use crate::pitch::Pitch;

/// A discrete key event. Velocity is carried for handlers that want it;
/// playback itself runs at the sample's recorded level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed.
    Press { pitch: Pitch, velocity: u8 },
    /// A key was released.
    Release { pitch: Pitch, velocity: u8 },
}

impl Event {
    /// Decodes a raw MIDI message into a key event. Messages other than
    /// Note On/Off are ignored. A Note On with velocity 0 is a release,
    /// per common keyboard behavior.
    pub fn from_midi(raw: &[u8]) -> Option<Event> {
        let event = LiveEvent::parse(raw).ok()?;
        let LiveEvent::Midi { message, .. } = event else {
            return None;
        };

        match message {
            MidiMessage::NoteOn { key, vel } if u8::from(vel) > 0 => Some(Event::Press {
                pitch: Pitch::from_midi(u8::from(key)),
                velocity: u8::from(vel),
            }),
            MidiMessage::NoteOn { key, vel } | MidiMessage::NoteOff { key, vel } => {
                Some(Event::Release {
                    pitch: Pitch::from_midi(u8::from(key)),
                    velocity: u8::from(vel),
                })
            }
            _ => None,
        }
    }

    /// The pitch this event refers to.
    #[allow(dead_code)]
    pub fn pitch(&self) -> Pitch {
        match self {
            Event::Press { pitch, .. } | Event::Release { pitch, .. } => *pitch,
        }
    }

    /// The velocity the event carried.
    #[allow(dead_code)]
    pub fn velocity(&self) -> u8 {
        match self {
            Event::Press { velocity, .. } | Event::Release { velocity, .. } => *velocity,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Press { pitch, velocity } => write!(f, "PRESS {} ({})", pitch, velocity),
            Event::Release { pitch, velocity } => write!(f, "RELEASE {} ({})", pitch, velocity),
        }
    }
}

/// Anything that wants key events. Handlers are registered with the player
/// and invoked for every decoded event, in registration order.
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &Event);
}

/// Logs every event it sees.
pub struct EventLogger;

impl EventHandler for EventLogger {
    fn handle_event(&self, event: &Event) {
        info!(event = %event, "Key event");
    }
}
