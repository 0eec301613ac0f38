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

use parking_lot::Mutex;

use crate::engine::Renderer;
use crate::playsync::CancelHandle;

/// A mock audio device. Doesn't actually play anything; tests pull blocks
/// by hand.
#[derive(Clone)]
pub struct Device {
    name: String,
    renderer: Arc<Mutex<Option<Renderer>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            renderer: Arc::new(Mutex::new(None)),
        }
    }

    #[cfg(test)]
    /// Renders one block of the given size, as the driver callback would.
    pub fn pull(&self, frames: usize) -> Vec<f32> {
        let mut renderer = self.renderer.lock();
        let renderer = renderer.as_mut().expect("start was not called");
        let mut block = vec![0.0f32; frames];
        renderer.render(&mut block);
        block
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn start(
        &self,
        renderer: Renderer,
        _cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error>> {
        let mut stored = self.renderer.lock();
        if stored.is_some() {
            return Err("Already started.".into());
        }
        *stored = Some(renderer);
        Ok(())
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mock)", self.name)
    }
}
