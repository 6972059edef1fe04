//! HID usage pages, usages and IOKit element types.

pub const PAGE_GENERIC_DESKTOP: u32 = 0x01;
pub const PAGE_SIMULATION: u32 = 0x02;
pub const PAGE_BUTTON: u32 = 0x09;
pub const PAGE_CONSUMER: u32 = 0x0C;

pub const GD_JOYSTICK: u32 = 0x04;
pub const GD_GAMEPAD: u32 = 0x05;
pub const GD_MULTI_AXIS_CONTROLLER: u32 = 0x08;

pub const GD_X: u32 = 0x30;
pub const GD_Y: u32 = 0x31;
pub const GD_Z: u32 = 0x32;
pub const GD_RX: u32 = 0x33;
pub const GD_RY: u32 = 0x34;
pub const GD_RZ: u32 = 0x35;
pub const GD_SLIDER: u32 = 0x36;
pub const GD_DIAL: u32 = 0x37;
pub const GD_WHEEL: u32 = 0x38;
pub const GD_HATSWITCH: u32 = 0x39;
pub const GD_COUNTED_BUFFER: u32 = 0x3A;
pub const GD_START: u32 = 0x3D;
pub const GD_SELECT: u32 = 0x3E;
pub const GD_SYSTEM_MAIN_MENU: u32 = 0x85;
pub const GD_DPAD_UP: u32 = 0x90;
pub const GD_DPAD_DOWN: u32 = 0x91;
pub const GD_DPAD_RIGHT: u32 = 0x92;
pub const GD_DPAD_LEFT: u32 = 0x93;

pub const SIM_RUDDER: u32 = 0xBA;
pub const SIM_THROTTLE: u32 = 0xBB;
pub const SIM_ACCELERATOR: u32 = 0xC4;
pub const SIM_BRAKE: u32 = 0xC5;

/// `IOHIDElementType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Misc,
    Button,
    Axis,
    ScanCodes,
    Output,
    Feature,
    Collection,
    Unknown(u32),
}

impl ElementType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Misc,
            2 => Self::Button,
            3 => Self::Axis,
            4 => Self::ScanCodes,
            129 => Self::Output,
            257 => Self::Feature,
            513 => Self::Collection,
            other => Self::Unknown(other),
        }
    }
}

/// Top-level usages accepted as a gamepad.
pub fn is_gamepad_usage(page: u32, usage: u32) -> bool {
    page == PAGE_GENERIC_DESKTOP
        && matches!(usage, GD_JOYSTICK | GD_GAMEPAD | GD_MULTI_AXIS_CONTROLLER)
}

pub fn is_y_axis(page: u32, usage: u32) -> bool {
    page == PAGE_GENERIC_DESKTOP && matches!(usage, GD_Y | GD_RY)
}
