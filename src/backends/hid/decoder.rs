use super::classifier::{classify, CapabilityTable, Control, HidElement};
use super::normalize::{axis_value, hat_axes};
use super::usage::{is_gamepad_usage, is_y_axis};
use crate::device::AxisInfo;
use crate::event::{hid_code, Event, EventKind, GamepadId};
use crate::identity::{DeviceIds, UuidLayout, BUS_USB};
use crate::metadata::GamepadInfo;
use crate::registry::{Registry, Slot};
use tracing::{debug, info, trace};

/// Device slots when the config does not override it.
pub const DEFAULT_CAPACITY: usize = 32;

/// Properties read from a newly matched device.
#[derive(Debug)]
pub struct HidDeviceDescriptor<H> {
    /// Retained platform handle, released when the slot goes away.
    pub handle: H,
    pub location_id: Option<u32>,
    pub entry_id: Option<u64>,
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u16,
    pub product: Option<String>,
    /// `(usage_page, usage)` pairs from the device usage list.
    pub usages: Vec<(u32, u32)>,
    pub elements: Vec<HidElement>,
}

/// What the HID manager callbacks deliver.
#[derive(Debug)]
pub enum HidNotification<H> {
    Matched(HidDeviceDescriptor<H>),
    Removed { location_id: Option<u32> },
    Value {
        entry_id: u64,
        element: HidElement,
        value: i64,
    },
}

pub struct HidState<H> {
    _handle: H,
    location_id: u32,
    entry_id: u64,
    caps: CapabilityTable,
}

/// Device registry plus decoding for the IOKit HID backend.
///
/// Handles are owned by their slot; removing a slot drops its handle.
pub struct HidDecoder<H> {
    registry: Registry<HidState<H>>,
    invert_y: bool,
}

impl<H> HidDecoder<H> {
    pub fn new(capacity: usize, invert_y: bool) -> Self {
        Self {
            registry: Registry::with_capacity(capacity),
            invert_y,
        }
    }

    /// Apply one notification, appending the resulting events to `out`.
    pub fn handle(&mut self, note: HidNotification<H>, now: i64, out: &mut Vec<Event>) {
        match note {
            HidNotification::Matched(desc) => self.matched(desc, now, out),
            HidNotification::Removed { location_id } => self.removed(location_id, now, out),
            HidNotification::Value {
                entry_id,
                element,
                value,
            } => self.value(entry_id, &element, value, now, out),
        }
    }

    fn matched(&mut self, desc: HidDeviceDescriptor<H>, now: i64, out: &mut Vec<Event>) {
        if !desc.usages.iter().any(|&(p, u)| is_gamepad_usage(p, u)) {
            debug!(
                vendor_id = desc.vendor_id,
                product_id = desc.product_id,
                "iokit: no joystick/gamepad usage, skipped"
            );
            return;
        }
        let (Some(location_id), Some(entry_id)) = (desc.location_id, desc.entry_id) else {
            debug!(
                vendor_id = desc.vendor_id,
                product_id = desc.product_id,
                "iokit: missing location or registry entry id, skipped"
            );
            return;
        };
        if self
            .registry
            .find_connected(|s| s.state.entry_id == entry_id)
            .is_some()
        {
            trace!(entry_id, "iokit: already tracked");
            return;
        }
        if self.registry.is_full() {
            return;
        }

        let caps = CapabilityTable::build(&desc.elements);
        let uuid = DeviceIds::new(BUS_USB, desc.vendor_id, desc.product_id, desc.version)
            .fingerprint(UuidLayout::MacOs);
        let name = desc
            .product
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("HID {:04x}:{:04x}", desc.vendor_id, desc.product_id));
        let (vendor_id, product_id) = (desc.vendor_id, desc.product_id);

        let state = HidState {
            _handle: desc.handle,
            location_id,
            entry_id,
            caps,
        };
        let Some(id) = self.registry.insert(
            |id| GamepadInfo {
                id,
                name,
                uuid,
                vendor_id,
                product_id,
                force_feedback: false,
                path: Some(format!("iokit:{location_id:#010x}")),
            },
            state,
        ) else {
            return;
        };
        if let Some(slot) = self.registry.get(id) {
            info!(
                %id,
                name = %slot.info.name,
                vendor_id,
                product_id,
                location_id,
                "gamepad connected"
            );
        }
        out.push(Event::new(id, EventKind::Connected, now));
    }

    fn removed(&mut self, location_id: Option<u32>, now: i64, out: &mut Vec<Event>) {
        let Some(location_id) = location_id else {
            return;
        };
        let Some(id) = self
            .registry
            .find_connected(|s| s.state.location_id == location_id)
        else {
            return;
        };
        if let Some(slot) = self.registry.remove(id) {
            info!(%id, name = %slot.info.name, "gamepad disconnected");
            out.push(Event::new(id, EventKind::Disconnected, now));
        }
    }

    fn value(&mut self, entry_id: u64, el: &HidElement, value: i64, now: i64, out: &mut Vec<Event>) {
        let Some(id) = self
            .registry
            .find_connected(|s| s.state.entry_id == entry_id)
        else {
            return;
        };
        let Some(control) = classify(el.kind, el.usage_page, el.usage) else {
            return;
        };
        trace!(%id, page = el.usage_page, usage = el.usage, value, "iokit: value");
        match control {
            Control::Hat => {
                let (x, y) = hat_axes(value, el.logical_min, el.logical_max);
                out.push(Event::axis(id, hid_code(el.usage_page, el.usage), f64::from(x), now));
                out.push(Event::axis(
                    id,
                    hid_code(el.usage_page, el.usage + 1),
                    f64::from(y),
                    now,
                ));
            }
            Control::Axis => {
                let v = axis_value(
                    value,
                    el.logical_min,
                    el.logical_max,
                    is_y_axis(el.usage_page, el.usage),
                    self.invert_y,
                );
                out.push(Event::axis(id, el.code(), v, now));
            }
            Control::Button => out.push(Event::button(id, el.code(), value != 0, now)),
        }
    }

    pub fn gamepad_count(&self) -> usize {
        self.registry.connected_count()
    }

    pub fn gamepad_ids(&self) -> Vec<GamepadId> {
        self.registry.connected_ids()
    }

    pub fn info(&self, id: GamepadId) -> Option<GamepadInfo> {
        self.slot(id).map(|s| s.info.clone())
    }

    pub fn axes(&self, id: GamepadId) -> Vec<u32> {
        self.slot(id)
            .map(|s| s.state.caps.axis_codes())
            .unwrap_or_default()
    }

    pub fn buttons(&self, id: GamepadId) -> Vec<u32> {
        self.slot(id)
            .map(|s| s.state.caps.buttons.clone())
            .unwrap_or_default()
    }

    pub fn axis_info(&self, id: GamepadId, code: u32) -> Option<AxisInfo> {
        self.slot(id)?.state.caps.axis_info(code)
    }

    /// Drop every slot (and with it every retained handle).
    pub fn clear(&mut self) {
        let released = self.registry.drain();
        debug!(count = released.len(), "iokit: released device handles");
    }

    fn slot(&self, id: GamepadId) -> Option<&Slot<HidState<H>>> {
        self.registry.get(id).filter(|s| s.connected)
    }
}
