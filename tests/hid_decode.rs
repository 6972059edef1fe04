//! IOKit HID decoding from synthetic manager notifications.

use padstream::backends::hid::usage::*;
use padstream::backends::hid::{
    ElementType, HidBackend, HidDecoder, HidDeviceDescriptor, HidElement, HidNotification,
    HidShared, RunLoop,
};
use padstream::{hid_code, AxisInfo, Backend, BackendConfig, Event, EventKind, GamepadId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type Handle = Arc<()>;

const LOCATION: u32 = 0x1420_0000;

fn elements() -> Vec<HidElement> {
    let x = HidElement::new(2, ElementType::Misc, PAGE_GENERIC_DESKTOP, GD_X).with_range(0, 255);
    let y = HidElement::new(3, ElementType::Misc, PAGE_GENERIC_DESKTOP, GD_Y).with_range(0, 255);
    let hat =
        HidElement::new(4, ElementType::Misc, PAGE_GENERIC_DESKTOP, GD_HATSWITCH).with_range(0, 7);
    let b2 = HidElement::new(6, ElementType::Button, PAGE_BUTTON, 2).with_range(0, 1);
    let b1 = HidElement::new(5, ElementType::Button, PAGE_BUTTON, 1).with_range(0, 1);
    vec![
        HidElement::new(1, ElementType::Collection, PAGE_GENERIC_DESKTOP, GD_GAMEPAD)
            .with_children(vec![x.clone(), y, hat, b2, b1]),
        // The same X axis reachable a second time.
        HidElement::new(7, ElementType::Collection, PAGE_GENERIC_DESKTOP, 0x00)
            .with_children(vec![x]),
    ]
}

fn descriptor(handle: &Handle, entry_id: u64, location_id: u32) -> HidDeviceDescriptor<Handle> {
    HidDeviceDescriptor {
        handle: Arc::clone(handle),
        location_id: Some(location_id),
        entry_id: Some(entry_id),
        vendor_id: 0x054c,
        product_id: 0x09cc,
        version: 0x0100,
        product: Some("Wireless Controller".into()),
        usages: vec![(PAGE_GENERIC_DESKTOP, GD_GAMEPAD)],
        elements: elements(),
    }
}

fn run(dec: &mut HidDecoder<Handle>, note: HidNotification<Handle>) -> Vec<EventKind> {
    let mut out = Vec::new();
    dec.handle(note, 0, &mut out);
    out.into_iter().map(|e| e.kind).collect()
}

fn value(entry_id: u64, element: HidElement, value: i64) -> HidNotification<Handle> {
    HidNotification::Value {
        entry_id,
        element,
        value,
    }
}

fn connected(invert_y: bool) -> (Handle, HidDecoder<Handle>) {
    let handle = Handle::default();
    let mut dec = HidDecoder::new(32, invert_y);
    let events = run(&mut dec, HidNotification::Matched(descriptor(&handle, 42, LOCATION)));
    assert_eq!(events, vec![EventKind::Connected]);
    (handle, dec)
}

#[test]
fn matched_device_gets_identity() {
    let (_handle, dec) = connected(false);
    let info = dec.info(GamepadId(0)).unwrap();
    assert_eq!(info.name, "Wireless Controller");
    assert_eq!(info.uuid, "030000004c050000cc09000000010000");
    assert_eq!(info.path.as_deref(), Some("iokit:0x14200000"));
    assert!(!info.force_feedback);
}

#[test]
fn capability_table_is_ordered_and_deduplicated() {
    let (_handle, dec) = connected(false);
    let id = GamepadId(0);
    assert_eq!(
        dec.axes(id),
        vec![
            hid_code(PAGE_GENERIC_DESKTOP, GD_X),
            hid_code(PAGE_GENERIC_DESKTOP, GD_Y),
            hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH),
            hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH + 1),
        ]
    );
    assert_eq!(
        dec.buttons(id),
        vec![hid_code(PAGE_BUTTON, 1), hid_code(PAGE_BUTTON, 2)]
    );
    assert_eq!(
        dec.axis_info(id, hid_code(PAGE_GENERIC_DESKTOP, GD_X)),
        Some(AxisInfo { min: 0, max: 255 })
    );
    assert_eq!(
        dec.axis_info(id, hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH + 1)),
        Some(AxisInfo { min: -1, max: 1 })
    );
    assert_eq!(dec.axis_info(id, hid_code(PAGE_GENERIC_DESKTOP, GD_RZ)), None);
}

#[test]
fn non_gamepads_and_incomplete_devices_are_skipped() {
    let handle = Handle::default();
    let mut dec = HidDecoder::new(32, false);

    let mut mouse = descriptor(&handle, 1, 1);
    mouse.usages = vec![(PAGE_GENERIC_DESKTOP, 0x02)];
    assert!(run(&mut dec, HidNotification::Matched(mouse)).is_empty());

    let mut no_entry = descriptor(&handle, 2, 2);
    no_entry.entry_id = None;
    assert!(run(&mut dec, HidNotification::Matched(no_entry)).is_empty());

    let mut no_location = descriptor(&handle, 3, 3);
    no_location.location_id = None;
    assert!(run(&mut dec, HidNotification::Matched(no_location)).is_empty());

    assert_eq!(dec.gamepad_count(), 0);
    assert_eq!(Arc::strong_count(&handle), 1);
}

#[test]
fn rematching_a_connected_device_is_a_no_op() {
    let (handle, mut dec) = connected(false);
    assert!(run(&mut dec, HidNotification::Matched(descriptor(&handle, 42, LOCATION))).is_empty());
    assert_eq!(dec.gamepad_count(), 1);
    assert_eq!(Arc::strong_count(&handle), 2);
}

#[test]
fn removal_frees_the_slot_and_handle() {
    let (handle, mut dec) = connected(false);
    assert!(run(&mut dec, HidNotification::Removed { location_id: Some(7) }).is_empty());
    assert!(run(&mut dec, HidNotification::Removed { location_id: None }).is_empty());

    let events = run(
        &mut dec,
        HidNotification::Removed {
            location_id: Some(LOCATION),
        },
    );
    assert_eq!(events, vec![EventKind::Disconnected]);
    assert_eq!(dec.gamepad_count(), 0);
    assert!(dec.info(GamepadId(0)).is_none());
    assert_eq!(Arc::strong_count(&handle), 1);

    // A reconnect is a new device with a new id.
    let mut out = Vec::new();
    dec.handle(
        HidNotification::Matched(descriptor(&handle, 43, LOCATION)),
        5,
        &mut out,
    );
    assert_eq!(out, vec![Event::new(GamepadId(1), EventKind::Connected, 5)]);
}

#[test]
fn capacity_exhaustion_drops_silently() {
    let handle = Handle::default();
    let mut dec = HidDecoder::new(1, false);
    assert_eq!(
        run(&mut dec, HidNotification::Matched(descriptor(&handle, 1, 1))),
        vec![EventKind::Connected]
    );
    assert!(run(&mut dec, HidNotification::Matched(descriptor(&handle, 2, 2))).is_empty());
    assert_eq!(dec.gamepad_count(), 1);
    assert_eq!(Arc::strong_count(&handle), 2);
}

#[test]
fn values_decode_by_element_kind() {
    let (_handle, mut dec) = connected(false);
    let x = HidElement::new(2, ElementType::Misc, PAGE_GENERIC_DESKTOP, GD_X).with_range(0, 255);
    let hat =
        HidElement::new(4, ElementType::Misc, PAGE_GENERIC_DESKTOP, GD_HATSWITCH).with_range(0, 7);
    let button = HidElement::new(5, ElementType::Button, PAGE_BUTTON, 1).with_range(0, 1);

    assert_eq!(
        run(&mut dec, value(42, x, 255)),
        vec![EventKind::AxisChanged {
            code: hid_code(PAGE_GENERIC_DESKTOP, GD_X),
            value: 1.0
        }]
    );
    assert_eq!(
        run(&mut dec, value(42, hat.clone(), 2)),
        vec![
            EventKind::AxisChanged {
                code: hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH),
                value: 1.0
            },
            EventKind::AxisChanged {
                code: hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH + 1),
                value: 0.0
            },
        ]
    );
    assert_eq!(
        run(&mut dec, value(42, hat, 0)),
        vec![
            EventKind::AxisChanged {
                code: hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH),
                value: 0.0
            },
            EventKind::AxisChanged {
                code: hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH + 1),
                value: -1.0
            },
        ]
    );
    assert_eq!(
        run(&mut dec, value(42, button.clone(), 1)),
        vec![EventKind::ButtonPressed {
            code: hid_code(PAGE_BUTTON, 1)
        }]
    );
    assert_eq!(
        run(&mut dec, value(42, button.clone(), 0)),
        vec![EventKind::ButtonReleased {
            code: hid_code(PAGE_BUTTON, 1)
        }]
    );

    // Unknown device and unsupported usage.
    assert!(run(&mut dec, value(99, button, 1)).is_empty());
    let led = HidElement::new(9, ElementType::Output, 0x08, 0x01);
    assert!(run(&mut dec, value(42, led, 1)).is_empty());
}

#[test]
fn y_inversion_is_configurable() {
    let y = HidElement::new(3, ElementType::Misc, PAGE_GENERIC_DESKTOP, GD_Y).with_range(0, 255);
    let code = hid_code(PAGE_GENERIC_DESKTOP, GD_Y);

    let (_h, mut plain) = connected(false);
    assert_eq!(
        run(&mut plain, value(42, y.clone(), 255)),
        vec![EventKind::AxisChanged { code, value: 1.0 }]
    );

    let (_h, mut inverted) = connected(true);
    assert_eq!(
        run(&mut inverted, value(42, y, 255)),
        vec![EventKind::AxisChanged { code, value: -1.0 }]
    );
}

struct FlagLoop(Arc<AtomicBool>);

impl RunLoop for FlagLoop {
    fn stop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[test]
fn backend_blocks_until_the_run_loop_delivers() {
    let shared = Arc::new(HidShared::<Handle>::new(&BackendConfig::default()));
    let stopped = Arc::new(AtomicBool::new(false));
    let mut backend = HidBackend::new(
        Arc::clone(&shared),
        Some(Box::new(FlagLoop(Arc::clone(&stopped)))),
    );
    assert!(backend.next_event().is_none());
    assert!(!backend.poll_timeout(0));

    let handle = Handle::default();
    let producer = {
        let shared = Arc::clone(&shared);
        let handle = Arc::clone(&handle);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            shared.dispatch(HidNotification::Matched(descriptor(&handle, 42, LOCATION)));
        })
    };

    let ev = backend.next_event_timeout(5_000).unwrap();
    producer.join().unwrap();
    assert_eq!(ev.kind, EventKind::Connected);
    assert_eq!(backend.gamepad_count(), 1);
    assert_eq!(backend.gamepad_ids(), vec![GamepadId(0)]);
    assert!(!backend.set_rumble(GamepadId(0), 1.0, 1.0, 100));

    drop(backend);
    assert!(stopped.load(Ordering::SeqCst));
    // The decoder released every retained handle on shutdown.
    assert_eq!(Arc::strong_count(&handle), 1);
}
