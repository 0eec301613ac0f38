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

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

/// Priority requested for the audio render thread.
const RENDER_THREAD_PRIORITY: u8 = 70;

/// Promotes the calling thread for audio rendering. Called once from inside
/// the stream callback, since the callback thread is created by the driver.
/// Failure is survivable; the engine still renders at normal priority.
pub fn promote_render_thread() {
    let priority = match ThreadPriorityValue::try_from(RENDER_THREAD_PRIORITY) {
        Ok(priority) => priority,
        Err(_) => return,
    };
    let priority = ThreadPriority::Crossplatform(priority);

    if let Err(e) = set_current_thread_priority(priority) {
        warn!(error = ?e, "Failed to raise audio render thread priority");
        return;
    }

    #[cfg(unix)]
    {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };

        match set_thread_priority_and_policy(
            thread_native_id(),
            priority,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => info!("Enabled RT SCHED_FIFO for audio render thread"),
            Err(e) => warn!(
                error = ?e,
                "Failed to set RT SCHED_FIFO for audio render thread"
            ),
        }
    }
}
