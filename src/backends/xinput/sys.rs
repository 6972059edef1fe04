//! Runtime-resolved XInput library.
#![cfg(target_os = "windows")]

use super::{XInputApi, XState};
use crate::error::{Error, Result};
use std::ffi::CString;
use tracing::{debug, info};
use windows_sys::Win32::Foundation::{FreeLibrary, HMODULE};
use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};
use windows_sys::Win32::UI::Input::XboxController::{XINPUT_STATE, XINPUT_VIBRATION};

type GetStateFn = unsafe extern "system" fn(u32, *mut XINPUT_STATE) -> u32;
type SetStateFn = unsafe extern "system" fn(u32, *mut XINPUT_VIBRATION) -> u32;

const ERROR_SUCCESS: u32 = 0;

pub struct XInputLibrary {
    module: HMODULE,
    get_state: GetStateFn,
    set_state: Option<SetStateFn>,
}

// SAFETY: the module handle and resolved entry points are process-global and
// XInput is callable from any thread.
unsafe impl Send for XInputLibrary {}

impl XInputLibrary {
    /// Load the first library in `names` that exports `XInputGetState`.
    pub fn load(names: &[String]) -> Result<Self> {
        for name in names {
            let Ok(cname) = CString::new(name.as_str()) else {
                continue;
            };
            // SAFETY: `cname` is NUL-terminated and outlives the call.
            let module = unsafe { LoadLibraryA(cname.as_ptr().cast()) };
            if module.is_null() {
                debug!(library = %name, "xinput: library not found");
                continue;
            }
            // SAFETY: symbol names are NUL-terminated literals; the transmutes
            // restore the documented signatures.
            let get_state = unsafe { GetProcAddress(module, b"XInputGetState\0".as_ptr()) }
                .map(|f| unsafe { std::mem::transmute::<_, GetStateFn>(f) });
            let set_state = unsafe { GetProcAddress(module, b"XInputSetState\0".as_ptr()) }
                .map(|f| unsafe { std::mem::transmute::<_, SetStateFn>(f) });

            let Some(get_state) = get_state else {
                debug!(library = %name, "xinput: XInputGetState missing");
                // SAFETY: `module` came from LoadLibraryA above.
                unsafe { FreeLibrary(module) };
                continue;
            };
            info!(library = %name, rumble = set_state.is_some(), "xinput: library loaded");
            return Ok(Self {
                module,
                get_state,
                set_state,
            });
        }
        Err(Error::Unsupported("XInput"))
    }
}

impl XInputApi for XInputLibrary {
    fn get_state(&mut self, slot: u32) -> Option<XState> {
        // SAFETY: XINPUT_STATE is plain data; all-zero is a valid value.
        let mut state: XINPUT_STATE = unsafe { std::mem::zeroed() };
        // SAFETY: `state` is a valid out-pointer for the duration of the call.
        if unsafe { (self.get_state)(slot, &mut state) } != ERROR_SUCCESS {
            return None;
        }
        let gp = state.Gamepad;
        Some(XState {
            packet: state.dwPacketNumber,
            buttons: gp.wButtons as u16,
            left_trigger: gp.bLeftTrigger,
            right_trigger: gp.bRightTrigger,
            lx: gp.sThumbLX,
            ly: gp.sThumbLY,
            rx: gp.sThumbRX,
            ry: gp.sThumbRY,
        })
    }

    fn set_vibration(&mut self, slot: u32, left: u16, right: u16) -> bool {
        let Some(set_state) = self.set_state else {
            return false;
        };
        let mut vib = XINPUT_VIBRATION {
            wLeftMotorSpeed: left,
            wRightMotorSpeed: right,
        };
        // SAFETY: `vib` is a valid in-pointer for the duration of the call.
        unsafe { set_state(slot, &mut vib) == ERROR_SUCCESS }
    }

    fn supports_vibration(&self) -> bool {
        self.set_state.is_some()
    }
}

impl Drop for XInputLibrary {
    fn drop(&mut self) {
        // SAFETY: `module` came from LoadLibraryA and is released once.
        unsafe { FreeLibrary(self.module) };
    }
}
