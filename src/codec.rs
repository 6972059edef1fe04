//! Fixed-layout binary records for crossing a process or language boundary.
//!
//! In-process consumers should use [`Event`] directly; these helpers exist for
//! hosts that move events through a byte buffer.
//!
//! ## Event record (32 bytes, little-endian)
//! ```text
//! offset  size  field
//!      0     4  tag      (see `event::tags`)
//!      4     4  id
//!      8     4  code
//!     12     4  reserved (always 0)
//!     16     8  value    (f64)
//!     24     8  time_ms  (i64)
//! ```
//! An **empty** buffer means "no event available".
//!
//! ## Capability records
//! - code lists: packed `i32` codes, little-endian
//! - axis info: `{present: i32, min: i32, max: i32}` (12 bytes)

use crate::device::AxisInfo;
use crate::event::{tags, Event, EventKind, GamepadId};

/// Size of one encoded event.
pub const EVENT_RECORD_LEN: usize = 32;

/// Size of one encoded axis info record.
pub const AXIS_INFO_RECORD_LEN: usize = 12;

/// Encode an optional event; `None` encodes as an empty buffer.
pub fn encode_event(event: Option<&Event>) -> Vec<u8> {
    match event {
        Some(ev) => encode_record(ev).to_vec(),
        None => Vec::new(),
    }
}

/// Encode one event into its fixed record.
pub fn encode_record(ev: &Event) -> [u8; EVENT_RECORD_LEN] {
    let mut out = [0u8; EVENT_RECORD_LEN];
    out[0..4].copy_from_slice(&ev.kind.tag().to_le_bytes());
    out[4..8].copy_from_slice(&ev.id.0.to_le_bytes());
    out[8..12].copy_from_slice(&ev.kind.code().to_le_bytes());
    // 12..16 reserved
    out[16..24].copy_from_slice(&ev.kind.value().to_le_bytes());
    out[24..32].copy_from_slice(&ev.time_ms.to_le_bytes());
    out
}

/// Decode a record produced by [`encode_event`].
///
/// Returns `None` for the empty "no event" buffer, a buffer of the wrong length,
/// or an unknown tag.
pub fn decode_event(bytes: &[u8]) -> Option<Event> {
    let rec: &[u8; EVENT_RECORD_LEN] = bytes.try_into().ok()?;
    let tag = u32_at(rec, 0);
    let id = GamepadId(u32_at(rec, 4));
    let code = u32_at(rec, 8);
    let value = f64::from_le_bytes(array_at(rec, 16));
    let time_ms = i64::from_le_bytes(array_at(rec, 24));

    let kind = match tag {
        tags::CONNECTED => EventKind::Connected,
        tags::DISCONNECTED => EventKind::Disconnected,
        tags::BUTTON_PRESSED => EventKind::ButtonPressed { code },
        tags::BUTTON_RELEASED => EventKind::ButtonReleased { code },
        tags::AXIS_CHANGED => EventKind::AxisChanged { code, value },
        tags::BUTTON_CHANGED => EventKind::ButtonChanged { code, value },
        _ => return None,
    };
    Some(Event { id, kind, time_ms })
}

/// Pack a code list as little-endian `i32`s.
pub fn encode_codes(codes: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(codes.len() * 4);
    for &c in codes {
        // Codes are carried as i32 on the wire; the bit pattern is preserved.
        out.extend_from_slice(&(c as i32).to_le_bytes());
    }
    out
}

/// Inverse of [`encode_codes`]; a trailing partial word is ignored.
pub fn decode_codes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|w| i32::from_le_bytes([w[0], w[1], w[2], w[3]]) as u32)
        .collect()
}

/// Encode an axis info query result.
pub fn encode_axis_info(info: Option<AxisInfo>) -> [u8; AXIS_INFO_RECORD_LEN] {
    let (present, min, max) = match info {
        Some(i) => (1i32, i.min, i.max),
        None => (0, 0, 0),
    };
    let mut out = [0u8; AXIS_INFO_RECORD_LEN];
    out[0..4].copy_from_slice(&present.to_le_bytes());
    out[4..8].copy_from_slice(&min.to_le_bytes());
    out[8..12].copy_from_slice(&max.to_le_bytes());
    out
}

pub fn decode_axis_info(bytes: &[u8]) -> Option<AxisInfo> {
    let rec: &[u8; AXIS_INFO_RECORD_LEN] = bytes.try_into().ok()?;
    if u32_at(rec, 0) == 0 {
        return None;
    }
    Some(AxisInfo {
        min: i32::from_le_bytes(array_at(rec, 4)),
        max: i32::from_le_bytes(array_at(rec, 8)),
    })
}

#[inline]
fn array_at<const N: usize>(buf: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[at..at + N]);
    out
}

#[inline]
fn u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(array_at(buf, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::codes;

    #[test]
    fn none_encodes_empty() {
        assert!(encode_event(None).is_empty());
        assert!(decode_event(&[]).is_none());
    }

    #[test]
    fn record_layout_is_fixed() {
        let ev = Event::axis(GamepadId(7), codes::AXIS_RSTICKY, -0.5, 0x0102_0304_0506);
        let rec = encode_record(&ev);
        assert_eq!(&rec[0..4], &tags::AXIS_CHANGED.to_le_bytes());
        assert_eq!(&rec[4..8], &7u32.to_le_bytes());
        assert_eq!(&rec[8..12], &104u32.to_le_bytes());
        assert_eq!(&rec[12..16], &[0, 0, 0, 0]);
        assert_eq!(&rec[16..24], &(-0.5f64).to_le_bytes());
        assert_eq!(&rec[24..32], &0x0102_0304_0506i64.to_le_bytes());
        assert_eq!(decode_event(&rec), Some(ev));
    }

    #[test]
    fn pressed_record_carries_one() {
        let ev = Event::button(GamepadId(0), codes::BTN_SOUTH, true, 1);
        let rec = encode_record(&ev);
        assert_eq!(f64::from_le_bytes(array_at(&rec, 16)), 1.0);
    }

    #[test]
    fn unknown_tag_and_short_buffer_are_rejected() {
        let mut rec = encode_record(&Event::new(GamepadId(0), EventKind::Connected, 0));
        rec[0] = 42;
        assert!(decode_event(&rec).is_none());
        assert!(decode_event(&rec[..31]).is_none());
    }

    #[test]
    fn codes_pack_as_i32() {
        let raw = encode_codes(&[0, 18, 0x0001_0039]);
        assert_eq!(raw.len(), 12);
        assert_eq!(decode_codes(&raw), vec![0, 18, 0x0001_0039]);
    }

    #[test]
    fn axis_info_record() {
        let rec = encode_axis_info(Some(AxisInfo { min: -32768, max: 32767 }));
        assert_eq!(&rec[0..4], &1i32.to_le_bytes());
        assert_eq!(decode_axis_info(&rec), Some(AxisInfo { min: -32768, max: 32767 }));
        assert_eq!(encode_axis_info(None), [0u8; 12]);
        assert_eq!(decode_axis_info(&[0u8; 12]), None);
    }
}
