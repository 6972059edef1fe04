use padstream::backends::hid::normalize::{axis_value, hat_axes};
use padstream::identity::{fingerprint_bytes, DeviceIds, UuidLayout};
use padstream::queue::EventQueue;
use padstream::{Event, EventKind, GamepadId};
use proptest::prelude::*;

fn ev(n: u32) -> Event {
    Event::new(GamepadId(n), EventKind::Connected, i64::from(n))
}

proptest! {
    #[test]
    fn queue_keeps_the_last_capacity_events(cap in 1usize..64, pushes in 0u32..256) {
        let mut q = EventQueue::with_capacity(cap);
        for n in 0..pushes {
            q.push(ev(n));
        }
        let kept: Vec<u32> = std::iter::from_fn(|| q.try_pop()).map(|e| e.id.0).collect();
        let first = pushes.saturating_sub(cap as u32);
        let expected: Vec<u32> = (first..pushes).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn fingerprints_are_pure(bus: u16, vendor: u16, product: u16, version: u16) {
        let ids = DeviceIds::new(bus, vendor, product, version);
        for layout in [UuidLayout::Generic, UuidLayout::MacOs] {
            let a = ids.fingerprint(layout);
            prop_assert_eq!(&a, &ids.fingerprint(layout));
            prop_assert_eq!(a.len(), 32);
            prop_assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
        let g = fingerprint_bytes(ids, UuidLayout::Generic);
        prop_assert_eq!(&g[2..4], &vendor.to_le_bytes());
        prop_assert_eq!(&g[4..6], &product.to_le_bytes());
        prop_assert!(g[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn axis_value_stays_in_unit_range(
        min in -70_000i32..70_000,
        width in 1i32..140_000,
        raw in any::<i32>(),
        is_y: bool,
        invert: bool,
    ) {
        let max = min + width;
        let v = axis_value(i64::from(raw), min, max, is_y, invert);
        prop_assert!((-1.0..=1.0).contains(&v));
        prop_assert_eq!(axis_value(i64::from(max), min, max, false, false), 1.0);
    }

    #[test]
    fn axis_value_min_is_minus_one_on_even_ranges(min in -70_000i32..70_000, half in 1i32..70_000) {
        let max = min + half * 2;
        prop_assert_eq!(axis_value(i64::from(min), min, max, false, false), -1.0);
    }

    #[test]
    fn hat_axes_are_ternary(raw in -4i64..12, eight_way: bool) {
        let max = if eight_way { 7 } else { 3 };
        let (x, y) = hat_axes(raw, 0, max);
        prop_assert!((-1..=1).contains(&x));
        prop_assert!((-1..=1).contains(&y));
    }
}
