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

//! The cpal output adapter.
//!
//! The engine renders mono blocks; the stream data callback is the pull
//! point, duplicating each frame across the device's output channels. The
//! stream lives on a dedicated thread because cpal streams cannot move
//! between threads.

use std::{error::Error, fmt, sync::mpsc, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use super::thread_priority::promote_render_thread;
use crate::config;
use crate::engine::Renderer;
use crate::playsync::CancelHandle;

/// Initial mono block capacity; grows once if the driver asks for more.
const INITIAL_BLOCK_CAPACITY: usize = 4096;

/// A cpal-backed audio output device.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The number of channels frames are duplicated across.
    channels: u16,
    /// The sample rate blocks are rendered at.
    sample_rate: u32,
}

impl Device {
    /// Lists the cpal output devices across all hosts.
    pub fn list() -> Result<Vec<Box<dyn super::Device>>, Box<dyn Error>> {
        let mut devices: Vec<Box<dyn super::Device>> = Vec::new();

        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id)?;
            for device in host.output_devices()? {
                let channels = device
                    .default_output_config()
                    .map(|config| config.channels())
                    .unwrap_or(0);
                devices.push(Box::new(Device {
                    name: device.name()?,
                    host_id,
                    channels,
                    sample_rate: 0,
                }));
            }
        }

        Ok(devices)
    }

    /// Gets the output device for the given configuration. With no device
    /// name configured, the default host's default output device is used.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        let (host_id, device) = match config.device() {
            Some(name) => find_device(name)?,
            None => {
                let host = cpal::default_host();
                let device = host
                    .default_output_device()
                    .ok_or("no default audio output device")?;
                (host.id(), device)
            }
        };

        let channels = device.default_output_config()?.channels();
        Ok(Device {
            name: device.name()?,
            host_id,
            channels,
            sample_rate: config.sample_rate(),
        })
    }
}

/// Finds an output device by name, searching every host.
fn find_device(name: &str) -> Result<(cpal::HostId, cpal::Device), Box<dyn Error>> {
    for host_id in cpal::available_hosts() {
        let host = cpal::host_from_id(host_id)?;
        for device in host.output_devices()? {
            if device.name()? == name {
                return Ok((host_id, device));
            }
        }
    }

    Err(format!("no audio output device named {}", name).into())
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    /// Starts the output stream on its own thread. Returns once the stream
    /// is playing (or failed to open); the thread keeps the stream alive
    /// until the cancel handle fires.
    fn start(
        &self,
        renderer: Renderer,
        cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error>> {
        let name = self.name.clone();
        let host_id = self.host_id;
        let channels = self.channels;
        let sample_rate = self.sample_rate;

        let (setup_tx, setup_rx) = mpsc::channel::<Result<(), String>>();
        thread::Builder::new()
            .name("keywave audio output".to_string())
            .spawn(move || {
                match open_stream(&name, host_id, channels, sample_rate, renderer) {
                    Ok(stream) => {
                        // Errors on the setup channel mean start() already
                        // returned; the stream plays regardless.
                        let _ = setup_tx.send(Ok(()));
                        cancel_handle.wait();
                        drop(stream);
                        info!(device = name, "Audio output stopped.");
                    }
                    Err(e) => {
                        let _ = setup_tx.send(Err(e.to_string()));
                    }
                }
            })?;

        setup_rx.recv()?.map_err(|e| e.into())
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<std::sync::Arc<super::mock::Device>, Box<dyn Error>> {
        Err("not a mock device".into())
    }
}

/// Opens and starts the output stream. Must be called on the thread that
/// will own the stream.
fn open_stream(
    name: &str,
    host_id: cpal::HostId,
    channels: u16,
    sample_rate: u32,
    mut renderer: Renderer,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let host = cpal::host_from_id(host_id)?;
    let device = host
        .output_devices()?
        .find(|device| device.name().is_ok_and(|n| n == name))
        .ok_or_else(|| format!("no audio output device named {}", name))?;

    if device.default_output_config()?.sample_format() != cpal::SampleFormat::F32 {
        return Err(format!("device {} does not support f32 output", name).into());
    }

    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    info!(
        device = name,
        channels, sample_rate, "Starting audio output."
    );

    let mut mono = vec![0.0f32; INITIAL_BLOCK_CAPACITY];
    let mut priority_set = false;
    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _| {
            if !priority_set {
                promote_render_thread();
                priority_set = true;
            }

            let channels = channels as usize;
            let frames = data.len() / channels;
            if mono.len() < frames {
                mono.resize(frames, 0.0);
            }

            renderer.render(&mut mono[..frames]);
            for (frame, sample) in data.chunks_exact_mut(channels).zip(mono.iter()) {
                frame.fill(*sample);
            }
        },
        |e| error!(error = %e, "Audio stream error."),
        None,
    )?;
    stream.play()?;

    Ok(stream)
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.channels,
            self.host_id.name()
        )
    }
}
