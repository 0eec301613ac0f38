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
use std::{error::Error, fmt, sync::Arc};

use crate::config;
use crate::engine::Renderer;
use crate::playsync::CancelHandle;

pub mod cpal;
pub mod mock;
mod thread_priority;

/// An audio output device that pulls blocks from the engine renderer.
pub trait Device: fmt::Display + Send + Sync {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// Starts continuous output. The device owns the renderer from here on,
    /// pulling one block per callback until the handle is cancelled.
    fn start(&self, renderer: Renderer, cancel_handle: CancelHandle)
        -> Result<(), Box<dyn Error>>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error>>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets a device for the given audio configuration.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    if let Some(device) = config.device() {
        if device.starts_with("mock") {
            return Ok(Arc::new(mock::Device::get(device)));
        }
    }

    Ok(Arc::new(cpal::Device::get(config)?))
}
