use super::{buttons, XInputApi, XState, SLOT_COUNT};
use crate::config::BackendConfig;
use crate::device::{AxisInfo, Backend, RumbleRequest};
use crate::event::{codes, now_ms, Event, EventKind, GamepadId};
use crate::identity::nil_fingerprint;
use crate::metadata::GamepadInfo;
use crate::queue::EventQueue;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Digital buttons in emission order.
const BUTTON_MAP: [(u16, u32); 14] = [
    (buttons::A, codes::BTN_SOUTH),
    (buttons::B, codes::BTN_EAST),
    (buttons::X, codes::BTN_WEST),
    (buttons::Y, codes::BTN_NORTH),
    (buttons::BACK, codes::BTN_SELECT),
    (buttons::START, codes::BTN_START),
    (buttons::LEFT_SHOULDER, codes::BTN_LT),
    (buttons::RIGHT_SHOULDER, codes::BTN_RT),
    (buttons::LEFT_THUMB, codes::BTN_LTHUMB),
    (buttons::RIGHT_THUMB, codes::BTN_RTHUMB),
    (buttons::DPAD_UP, codes::BTN_DPAD_UP),
    (buttons::DPAD_DOWN, codes::BTN_DPAD_DOWN),
    (buttons::DPAD_LEFT, codes::BTN_DPAD_LEFT),
    (buttons::DPAD_RIGHT, codes::BTN_DPAD_RIGHT),
];

const STICK_AXES: [u32; 4] = [
    codes::AXIS_LSTICKX,
    codes::AXIS_LSTICKY,
    codes::AXIS_RSTICKX,
    codes::AXIS_RSTICKY,
];

#[inline]
fn normalize_thumb(v: i16) -> f64 {
    if v == i16::MIN {
        return -1.0;
    }
    f64::from(v) / 32767.0
}

#[inline]
fn normalize_trigger(v: u8) -> f64 {
    f64::from(v) / 255.0
}

#[derive(Debug, Default)]
struct PadSlot {
    connected: bool,
    shadow: XState,
    rumble_until: Option<i64>,
}

/// Fixed four-slot XInput poller.
pub struct XInputBackend<A: XInputApi> {
    api: A,
    slots: [PadSlot; SLOT_COUNT],
    /// Slots actually polled (`max_gamepads`, at most four).
    active: usize,
    queue: EventQueue,
    poll_quantum: Duration,
}

impl<A: XInputApi> XInputBackend<A> {
    pub fn new(api: A, config: &BackendConfig) -> Self {
        Self {
            api,
            slots: Default::default(),
            active: config.capacity_or(SLOT_COUNT).min(SLOT_COUNT),
            queue: EventQueue::with_capacity(config.queue_capacity),
            poll_quantum: Duration::from_millis(config.poll_quantum_ms.max(1)),
        }
    }

    /// Query every slot once and queue the differences.
    pub fn cycle(&mut self, now: i64) {
        self.tick_rumble(now);
        for idx in 0..self.active {
            let state = self.api.get_state(idx as u32);
            self.update_slot(idx, state, now);
        }
    }

    fn update_slot(&mut self, idx: usize, state: Option<XState>, now: i64) {
        let id = GamepadId(idx as u32);
        let slot = &mut self.slots[idx];

        let st = match (slot.connected, state) {
            (false, None) => return,
            (false, Some(st)) => {
                slot.connected = true;
                slot.shadow = st;
                info!(%id, slot = idx, "gamepad connected");
                self.queue.push(Event::new(id, EventKind::Connected, now));
                return;
            }
            (true, None) => {
                slot.connected = false;
                if slot.rumble_until.take().is_some() && !self.api.set_vibration(idx as u32, 0, 0) {
                    debug!(%id, "xinput: failed to stop rumble on disconnect");
                }
                info!(%id, slot = idx, "gamepad disconnected");
                self.queue.push(Event::new(id, EventKind::Disconnected, now));
                return;
            }
            (true, Some(st)) => st,
        };

        if st.packet == slot.shadow.packet {
            return;
        }
        let old = std::mem::replace(&mut slot.shadow, st);
        trace!(%id, packet = st.packet, buttons = st.buttons, "xinput: sample");

        for &(mask, code) in &BUTTON_MAP {
            let was = old.buttons & mask != 0;
            let is = st.buttons & mask != 0;
            if was != is {
                self.queue.push(Event::button(id, code, is, now));
            }
        }

        for (code, before, after) in [
            (codes::BTN_LT2, old.left_trigger, st.left_trigger),
            (codes::BTN_RT2, old.right_trigger, st.right_trigger),
        ] {
            if before != after {
                let kind = EventKind::ButtonChanged {
                    code,
                    value: normalize_trigger(after),
                };
                self.queue.push(Event::new(id, kind, now));
            }
        }

        let sticks = [(old.lx, st.lx), (old.ly, st.ly), (old.rx, st.rx), (old.ry, st.ry)];
        for (code, (before, after)) in STICK_AXES.into_iter().zip(sticks) {
            if before != after {
                self.queue
                    .push(Event::axis(id, code, normalize_thumb(after), now));
            }
        }
    }

    /// Zero the motors of every slot whose rumble has expired.
    pub fn tick_rumble(&mut self, now: i64) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.rumble_until.is_some_and(|until| now >= until) {
                slot.rumble_until = None;
                if self.api.set_vibration(idx as u32, 0, 0) {
                    debug!(id = idx, "xinput: rumble expired");
                } else {
                    warn!(id = idx, "xinput: failed to stop rumble");
                }
            }
        }
    }

    /// Rumble with an explicit clock.
    pub fn rumble_at(
        &mut self,
        id: GamepadId,
        strong: f32,
        weak: f32,
        duration_ms: i32,
        now: i64,
    ) -> bool {
        let idx = id.0 as usize;
        if idx >= self.active || !self.slots[idx].connected || !self.api.supports_vibration() {
            return false;
        }
        match RumbleRequest::new(strong, weak, duration_ms) {
            RumbleRequest::Stop => {
                self.slots[idx].rumble_until = None;
                self.api.set_vibration(id.0, 0, 0)
            }
            RumbleRequest::Play {
                strong,
                weak,
                duration_ms,
            } => {
                if !self.api.set_vibration(id.0, strong, weak) {
                    self.slots[idx].rumble_until = None;
                    warn!(%id, "xinput: XInputSetState failed");
                    return false;
                }
                self.slots[idx].rumble_until = Some(now + i64::from(duration_ms));
                debug!(%id, strong, weak, duration_ms, "xinput: rumble started");
                true
            }
        }
    }

    fn slot(&self, id: GamepadId) -> Option<&PadSlot> {
        self.slots[..self.active]
            .get(id.0 as usize)
            .filter(|s| s.connected)
    }
}

impl<A: XInputApi> Backend for XInputBackend<A> {
    fn name(&self) -> &'static str {
        "xinput"
    }

    fn poll(&mut self) {
        self.cycle(now_ms());
    }

    fn poll_timeout(&mut self, timeout_ms: i32) -> bool {
        let deadline = (timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(u64::from(timeout_ms.unsigned_abs())));
        loop {
            self.cycle(now_ms());
            if !self.queue.is_empty() {
                return true;
            }
            let nap = match deadline {
                _ if timeout_ms == 0 => return false,
                None => self.poll_quantum,
                Some(d) => {
                    let left = d.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return false;
                    }
                    left.min(self.poll_quantum)
                }
            };
            std::thread::sleep(nap);
        }
    }

    fn next_event(&mut self) -> Option<Event> {
        self.queue.try_pop()
    }

    fn gamepad_count(&self) -> usize {
        self.slots[..self.active].iter().filter(|s| s.connected).count()
    }

    fn gamepad_ids(&self) -> Vec<GamepadId> {
        (0..self.active)
            .filter(|&i| self.slots[i].connected)
            .map(|i| GamepadId(i as u32))
            .collect()
    }

    fn info(&self, id: GamepadId) -> Option<GamepadInfo> {
        self.slot(id)?;
        Some(GamepadInfo {
            id,
            name: format!("XInput Controller {}", id.0),
            uuid: nil_fingerprint(),
            vendor_id: 0,
            product_id: 0,
            force_feedback: self.api.supports_vibration(),
            path: Some(format!("xinput:{}", id.0)),
        })
    }

    fn axes(&self, id: GamepadId) -> Vec<u32> {
        if self.slot(id).is_none() {
            return Vec::new();
        }
        STICK_AXES.to_vec()
    }

    fn buttons(&self, id: GamepadId) -> Vec<u32> {
        if self.slot(id).is_none() {
            return Vec::new();
        }
        let mut out: Vec<u32> = BUTTON_MAP.iter().map(|&(_, code)| code).collect();
        out.extend([codes::BTN_LT2, codes::BTN_RT2]);
        out.sort_unstable();
        out
    }

    fn axis_info(&self, id: GamepadId, code: u32) -> Option<AxisInfo> {
        self.slot(id)?;
        STICK_AXES.contains(&code).then_some(AxisInfo {
            min: i32::from(i16::MIN),
            max: i32::from(i16::MAX),
        })
    }

    fn set_rumble(&mut self, id: GamepadId, strong: f32, weak: f32, duration_ms: i32) -> bool {
        self.rumble_at(id, strong, weak, duration_ms, now_ms())
    }
}

impl<A: XInputApi> Drop for XInputBackend<A> {
    fn drop(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.rumble_until.take().is_some() {
                self.api.set_vibration(idx as u32, 0, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumb_extremes() {
        assert_eq!(normalize_thumb(i16::MIN), -1.0);
        assert_eq!(normalize_thumb(i16::MAX), 1.0);
        assert_eq!(normalize_thumb(0), 0.0);
        assert!((normalize_thumb(-32767) + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trigger_scale() {
        assert_eq!(normalize_trigger(0), 0.0);
        assert_eq!(normalize_trigger(255), 1.0);
    }

    #[test]
    fn button_table_covers_every_digital_bit() {
        let all = BUTTON_MAP.iter().fold(0u16, |acc, &(m, _)| acc | m);
        assert_eq!(all, 0xF3FF);
    }
}
