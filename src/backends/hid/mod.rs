//! IOKit-style HID backend core.
//!
//! Unlike evdev and XInput, HID input is pushed: the platform delivers match,
//! removal and value notifications on its own run-loop thread. That thread feeds
//! [`HidShared::dispatch`]; the consumer side ([`HidBackend`]) only reads the
//! shared queue and the decoder's registry.
//!
//! Everything here is platform-neutral. `backends::macos` supplies the run loop
//! and converts IOKit objects into [`HidNotification`]s.

pub mod classifier;
mod decoder;
pub mod normalize;
pub mod usage;

pub use classifier::{CapabilityTable, Control, HidElement};
pub use decoder::{HidDecoder, HidDeviceDescriptor, HidNotification, DEFAULT_CAPACITY};
pub use usage::ElementType;

use crate::config::BackendConfig;
use crate::device::{AxisInfo, Backend};
use crate::event::{now_ms, Event, GamepadId};
use crate::metadata::GamepadInfo;
use crate::queue::SharedEventQueue;
use parking_lot::Mutex;
use std::sync::Arc;

/// State shared between the run-loop thread and the consumer.
pub struct HidShared<H> {
    decoder: Mutex<HidDecoder<H>>,
    queue: SharedEventQueue,
}

impl<H> HidShared<H> {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            decoder: Mutex::new(HidDecoder::new(
                config.capacity_or(DEFAULT_CAPACITY),
                config.invert_y_axes,
            )),
            queue: SharedEventQueue::with_capacity(config.queue_capacity),
        }
    }

    /// Decode one notification and publish its events.
    pub fn dispatch(&self, note: HidNotification<H>) {
        let mut out = Vec::new();
        self.decoder.lock().handle(note, now_ms(), &mut out);
        if !out.is_empty() {
            self.queue.extend(out);
        }
    }

    pub fn queue(&self) -> &SharedEventQueue {
        &self.queue
    }
}

/// The producer side of a [`HidBackend`]. Stopping must not return until no
/// further [`HidShared::dispatch`] call can happen.
pub trait RunLoop: Send {
    fn stop(&mut self);
}

pub struct HidBackend<H> {
    shared: Arc<HidShared<H>>,
    run_loop: Option<Box<dyn RunLoop>>,
}

impl<H: Send> HidBackend<H> {
    pub fn new(shared: Arc<HidShared<H>>, run_loop: Option<Box<dyn RunLoop>>) -> Self {
        Self { shared, run_loop }
    }

    pub fn shared(&self) -> &Arc<HidShared<H>> {
        &self.shared
    }
}

impl<H: Send> Backend for HidBackend<H> {
    fn name(&self) -> &'static str {
        "iokit"
    }

    /// Events arrive on the run-loop thread; there is nothing to drive.
    fn poll(&mut self) {}

    fn poll_timeout(&mut self, timeout_ms: i32) -> bool {
        self.shared.queue.wait_ready(timeout_ms)
    }

    fn next_event(&mut self) -> Option<Event> {
        self.shared.queue.try_pop()
    }

    fn next_event_timeout(&mut self, timeout_ms: i32) -> Option<Event> {
        self.shared.queue.wait_pop(timeout_ms)
    }

    fn gamepad_count(&self) -> usize {
        self.shared.decoder.lock().gamepad_count()
    }

    fn gamepad_ids(&self) -> Vec<GamepadId> {
        self.shared.decoder.lock().gamepad_ids()
    }

    fn info(&self, id: GamepadId) -> Option<GamepadInfo> {
        self.shared.decoder.lock().info(id)
    }

    fn axes(&self, id: GamepadId) -> Vec<u32> {
        self.shared.decoder.lock().axes(id)
    }

    fn buttons(&self, id: GamepadId) -> Vec<u32> {
        self.shared.decoder.lock().buttons(id)
    }

    fn axis_info(&self, id: GamepadId, code: u32) -> Option<AxisInfo> {
        self.shared.decoder.lock().axis_info(id, code)
    }

    fn set_rumble(&mut self, _id: GamepadId, _strong: f32, _weak: f32, _duration_ms: i32) -> bool {
        false
    }
}

impl<H> Drop for HidBackend<H> {
    fn drop(&mut self) {
        if let Some(mut run_loop) = self.run_loop.take() {
            run_loop.stop();
        }
        self.shared.decoder.lock().clear();
    }
}
