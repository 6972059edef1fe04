//! Device fingerprints.
//!
//! A fingerprint is 16 bytes rendered as 32 lowercase hex characters. External
//! mapping databases key controller layouts by these strings, so the byte
//! placement below must not change.
//!
//! - **Generic** (evdev, XInput): `[bus:le16][vendor:le16][product:le16][version:le16][0; 8]`
//! - **IOKit**: `bus` byte at 0, `vendor` at 4..6, `product` at 8..10, `version` at
//!   12..14, everything else zero. All-zero ids produce the nil fingerprint.

use uuid::Uuid;

/// Linux `BUS_USB`; also the fixed bus byte of the IOKit layout.
pub const BUS_USB: u16 = 0x03;

/// Byte layout used to build a fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UuidLayout {
    Generic,
    MacOs,
}

/// Bus/vendor/product/version quadruple a fingerprint is derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DeviceIds {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl DeviceIds {
    pub fn new(bustype: u16, vendor: u16, product: u16, version: u16) -> Self {
        Self {
            bustype,
            vendor,
            product,
            version,
        }
    }

    pub fn fingerprint(&self, layout: UuidLayout) -> String {
        hex(&fingerprint_bytes(*self, layout))
    }
}

/// Raw fingerprint bytes for `ids` in `layout`.
pub fn fingerprint_bytes(ids: DeviceIds, layout: UuidLayout) -> [u8; 16] {
    let mut b = [0u8; 16];
    match layout {
        UuidLayout::Generic => {
            b[0..2].copy_from_slice(&ids.bustype.to_le_bytes());
            b[2..4].copy_from_slice(&ids.vendor.to_le_bytes());
            b[4..6].copy_from_slice(&ids.product.to_le_bytes());
            b[6..8].copy_from_slice(&ids.version.to_le_bytes());
        }
        UuidLayout::MacOs => {
            if ids.vendor == 0 && ids.product == 0 && ids.version == 0 {
                return b;
            }
            b[0] = BUS_USB as u8;
            b[4..6].copy_from_slice(&ids.vendor.to_le_bytes());
            b[8..10].copy_from_slice(&ids.product.to_le_bytes());
            b[12..14].copy_from_slice(&ids.version.to_le_bytes());
        }
    }
    b
}

/// 32-character lowercase hex rendering.
fn hex(bytes: &[u8; 16]) -> String {
    Uuid::from_bytes(*bytes).simple().to_string()
}

/// The all-zero fingerprint.
pub fn nil_fingerprint() -> String {
    Uuid::nil().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_layout_places_fields_little_endian() {
        let ids = DeviceIds::new(BUS_USB, 0x046d, 0xc262, 0);
        let b = fingerprint_bytes(ids, UuidLayout::Generic);
        assert_eq!(&b[0..8], &[0x03, 0x00, 0x6d, 0x04, 0x62, 0xc2, 0x00, 0x00]);
        assert_eq!(
            ids.fingerprint(UuidLayout::Generic),
            "03006d0462c200000000000000000000"
        );
    }

    #[test]
    fn macos_layout_spreads_fields() {
        let ids = DeviceIds::new(0, 0x054c, 0x09cc, 0x0100);
        assert_eq!(
            ids.fingerprint(UuidLayout::MacOs),
            "030000004c050000cc09000000010000"
        );
    }

    #[test]
    fn macos_all_zero_is_nil() {
        let ids = DeviceIds::new(BUS_USB, 0, 0, 0);
        assert_eq!(ids.fingerprint(UuidLayout::MacOs), nil_fingerprint());
        assert_eq!(nil_fingerprint().len(), 32);
    }

    #[test]
    fn layouts_differ() {
        let ids = DeviceIds::new(BUS_USB, 0x045e, 0x028e, 0x0114);
        assert_ne!(
            ids.fingerprint(UuidLayout::Generic),
            ids.fingerprint(UuidLayout::MacOs)
        );
    }
}
