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
use std::{error::Error, fmt};

use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use parking_lot::Mutex;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, info};

use crate::event::Event;

/// A midir-backed MIDI input device.
pub struct Device {
    name: String,
    input_port: MidiInputPort,
    event_connection: Mutex<Option<MidiInputConnection<()>>>,
}

/// Lists the available input ports.
pub fn list() -> Result<Vec<Box<dyn super::Device>>, Box<dyn Error>> {
    let input = MidiInput::new("keywave input")?;

    let mut devices: Vec<Box<dyn super::Device>> = Vec::new();
    for port in input.ports() {
        devices.push(Box::new(Device {
            name: input.port_name(&port)?,
            input_port: port,
            event_connection: Mutex::new(None),
        }));
    }

    Ok(devices)
}

/// Gets the input device with the given name, or the first available input
/// device if no name is given.
pub fn get(name: Option<&str>) -> Result<Device, Box<dyn Error>> {
    let input = MidiInput::new("keywave input")?;

    for port in input.ports() {
        let port_name = input.port_name(&port)?;
        if name.is_none_or(|name| port_name == name) {
            return Ok(Device {
                name: port_name,
                input_port: port,
                event_connection: Mutex::new(None),
            });
        }
    }

    match name {
        Some(name) => Err(format!("no MIDI input device named {}", name).into()),
        None => Err("no MIDI input devices available".into()),
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    /// Watches MIDI input and forwards decoded key events to the sender.
    fn watch_events(&self, sender: Sender<Event>) -> Result<(), Box<dyn Error>> {
        let mut event_connection = self.event_connection.lock();
        if event_connection.is_some() {
            return Err("Already watching events.".into());
        }

        info!(device = self.name, "Watching MIDI events.");

        let input = MidiInput::new("keywave input")?;
        *event_connection = Some(input.connect(
            &self.input_port,
            "keywave event watcher",
            move |_, raw_event, _| {
                let Some(event) = Event::from_midi(raw_event) else {
                    return;
                };

                debug!(event = %event, "Received MIDI event.");
                if let Err(e) = sender.blocking_send(event) {
                    error!(
                        err = format!("{:?}", e),
                        "Error sending MIDI event to receiver."
                    );
                }
            },
            (),
        )?);

        Ok(())
    }

    /// Stops watching events by dropping the connection.
    fn stop_watch_events(&self) {
        let event_connection = self.event_connection.lock().take();
        drop(event_connection);
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (midir)", self.name)
    }
}
