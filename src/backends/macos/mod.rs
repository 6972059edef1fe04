//! macOS IOKit HID manager thread.
//!
//! A dedicated thread owns an `IOHIDManager` scheduled on its own run loop. The
//! manager's callbacks turn IOKit objects into owned [`HidNotification`]s and
//! hand them to [`HidShared::dispatch`]. Shutdown flips a flag, stops the run
//! loop and joins the thread; device handles are released afterwards when the
//! decoder's registry is cleared.
#![cfg(target_os = "macos")]

use crate::backends::hid::{
    ElementType, HidBackend, HidDeviceDescriptor, HidElement, HidNotification, HidShared, RunLoop,
};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use core_foundation::array::{CFArray, CFArrayGetCount, CFArrayGetValueAtIndex, CFArrayRef};
use core_foundation::base::{
    kCFAllocatorDefault, CFAllocatorRef, CFGetTypeID, CFIndex, CFRelease, CFRetain, CFTypeRef,
    TCFType,
};
use core_foundation::dictionary::{CFDictionary, CFDictionaryGetValue, CFDictionaryRef};
use core_foundation::number::{CFNumber, CFNumberRef};
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopRef};
use core_foundation::string::{CFString, CFStringRef};
use crossbeam::channel;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

type IOReturn = i32;
type IOHIDManagerRef = *mut c_void;
type IOHIDDeviceRef = *mut c_void;
type IOHIDElementRef = *mut c_void;
type IOHIDValueRef = *mut c_void;
type IoService = u32;

type IOHIDDeviceCallback =
    extern "C" fn(context: *mut c_void, result: IOReturn, sender: *mut c_void, device: IOHIDDeviceRef);
type IOHIDValueCallback =
    extern "C" fn(context: *mut c_void, result: IOReturn, sender: *mut c_void, value: IOHIDValueRef);

const K_IOHID_OPTIONS_TYPE_NONE: u32 = 0;
const K_IO_RETURN_SUCCESS: IOReturn = 0;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOHIDManagerCreate(allocator: CFAllocatorRef, options: u32) -> IOHIDManagerRef;
    fn IOHIDManagerSetDeviceMatchingMultiple(manager: IOHIDManagerRef, multiple: CFArrayRef);
    fn IOHIDManagerRegisterDeviceMatchingCallback(
        manager: IOHIDManagerRef,
        callback: IOHIDDeviceCallback,
        context: *mut c_void,
    );
    fn IOHIDManagerRegisterDeviceRemovalCallback(
        manager: IOHIDManagerRef,
        callback: IOHIDDeviceCallback,
        context: *mut c_void,
    );
    fn IOHIDManagerRegisterInputValueCallback(
        manager: IOHIDManagerRef,
        callback: IOHIDValueCallback,
        context: *mut c_void,
    );
    fn IOHIDManagerScheduleWithRunLoop(manager: IOHIDManagerRef, run_loop: CFRunLoopRef, mode: CFStringRef);
    fn IOHIDManagerUnscheduleFromRunLoop(
        manager: IOHIDManagerRef,
        run_loop: CFRunLoopRef,
        mode: CFStringRef,
    );
    fn IOHIDManagerOpen(manager: IOHIDManagerRef, options: u32) -> IOReturn;
    fn IOHIDManagerClose(manager: IOHIDManagerRef, options: u32) -> IOReturn;

    fn IOHIDDeviceGetProperty(device: IOHIDDeviceRef, key: CFStringRef) -> CFTypeRef;
    fn IOHIDDeviceCopyMatchingElements(
        device: IOHIDDeviceRef,
        matching: CFDictionaryRef,
        options: u32,
    ) -> CFArrayRef;
    fn IOHIDDeviceGetService(device: IOHIDDeviceRef) -> IoService;
    fn IORegistryEntryGetRegistryEntryID(entry: IoService, entry_id: *mut u64) -> IOReturn;

    fn IOHIDValueGetElement(value: IOHIDValueRef) -> IOHIDElementRef;
    fn IOHIDValueGetIntegerValue(value: IOHIDValueRef) -> CFIndex;

    fn IOHIDElementGetDevice(element: IOHIDElementRef) -> IOHIDDeviceRef;
    fn IOHIDElementGetCookie(element: IOHIDElementRef) -> u32;
    fn IOHIDElementGetType(element: IOHIDElementRef) -> u32;
    fn IOHIDElementGetUsagePage(element: IOHIDElementRef) -> u32;
    fn IOHIDElementGetUsage(element: IOHIDElementRef) -> u32;
    fn IOHIDElementGetLogicalMin(element: IOHIDElementRef) -> CFIndex;
    fn IOHIDElementGetLogicalMax(element: IOHIDElementRef) -> CFIndex;
    fn IOHIDElementGetChildren(element: IOHIDElementRef) -> CFArrayRef;
}

/// A retained `IOHIDDeviceRef`, released on drop.
#[derive(Debug)]
pub struct DeviceHandle(IOHIDDeviceRef);

// SAFETY: CF objects are reference counted atomically; the handle is only
// retained and released, never used concurrently.
unsafe impl Send for DeviceHandle {}

impl DeviceHandle {
    /// # Safety
    /// `device` must be a valid `IOHIDDeviceRef`.
    unsafe fn retain(device: IOHIDDeviceRef) -> Self {
        CFRetain(device as CFTypeRef);
        Self(device)
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        // SAFETY: balanced with the CFRetain in `retain`.
        unsafe { CFRelease(self.0 as CFTypeRef) };
    }
}

type Shared = HidShared<DeviceHandle>;

struct SendRunLoop(CFRunLoop);

// SAFETY: CFRunLoopStop may be called from any thread.
unsafe impl Send for SendRunLoop {}

struct IoKitThread {
    run_loop: SendRunLoop,
    stopping: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RunLoop for IoKitThread {
    fn stop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.run_loop.0.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("iokit: run-loop thread panicked");
            }
        }
    }
}

/// Start the HID manager thread.
pub fn open(config: &BackendConfig) -> Result<HidBackend<DeviceHandle>> {
    let shared = Arc::new(Shared::new(config));
    let stopping = Arc::new(AtomicBool::new(false));
    let (tx, rx) = channel::bounded::<Result<SendRunLoop>>(1);

    let thread_shared = Arc::clone(&shared);
    let thread_stopping = Arc::clone(&stopping);
    let thread = std::thread::Builder::new()
        .name("padstream-iokit".into())
        .spawn(move || run(thread_shared, thread_stopping, tx))?;

    let run_loop = match rx.recv() {
        Ok(Ok(run_loop)) => run_loop,
        Ok(Err(e)) => {
            let _ = thread.join();
            return Err(e);
        }
        Err(_) => {
            let _ = thread.join();
            return Err(Error::Unsupported("IOKit HID manager"));
        }
    };
    info!("iokit: HID manager running");
    Ok(HidBackend::new(
        shared,
        Some(Box::new(IoKitThread {
            run_loop,
            stopping,
            thread: Some(thread),
        })),
    ))
}

fn matching_dict(page: i32, usage: i32) -> CFDictionary<CFString, CFNumber> {
    CFDictionary::from_CFType_pairs(&[
        (CFString::new("DeviceUsagePage"), CFNumber::from(page)),
        (CFString::new("DeviceUsage"), CFNumber::from(usage)),
    ])
}

fn run(shared: Arc<Shared>, stopping: Arc<AtomicBool>, tx: channel::Sender<Result<SendRunLoop>>) {
    // SAFETY: plain IOKit/CF calls on objects owned by this thread. `ctx`
    // stays alive until after the manager is closed and unscheduled.
    unsafe {
        let manager = IOHIDManagerCreate(kCFAllocatorDefault, K_IOHID_OPTIONS_TYPE_NONE);
        if manager.is_null() {
            let _ = tx.send(Err(Error::Unsupported("IOKit HID manager")));
            return;
        }

        let matching = CFArray::from_CFTypes(&[
            matching_dict(0x01, 0x04),
            matching_dict(0x01, 0x05),
            matching_dict(0x01, 0x08),
        ]);
        IOHIDManagerSetDeviceMatchingMultiple(manager, matching.as_concrete_TypeRef());

        let ctx = Box::into_raw(Box::new(shared)) as *mut c_void;
        IOHIDManagerRegisterDeviceMatchingCallback(manager, device_matched, ctx);
        IOHIDManagerRegisterDeviceRemovalCallback(manager, device_removed, ctx);
        IOHIDManagerRegisterInputValueCallback(manager, input_value, ctx);

        let run_loop = CFRunLoop::get_current();
        IOHIDManagerScheduleWithRunLoop(
            manager,
            run_loop.as_concrete_TypeRef(),
            kCFRunLoopDefaultMode,
        );
        let rc = IOHIDManagerOpen(manager, K_IOHID_OPTIONS_TYPE_NONE);
        if rc != K_IO_RETURN_SUCCESS {
            warn!(rc, "iokit: IOHIDManagerOpen failed");
        }

        if tx.send(Ok(SendRunLoop(run_loop.clone()))).is_ok() {
            while !stopping.load(Ordering::SeqCst) {
                let _ = CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, Duration::from_millis(250), false);
            }
        }

        IOHIDManagerUnscheduleFromRunLoop(
            manager,
            run_loop.as_concrete_TypeRef(),
            kCFRunLoopDefaultMode,
        );
        IOHIDManagerClose(manager, K_IOHID_OPTIONS_TYPE_NONE);
        CFRelease(manager as CFTypeRef);
        drop(Box::from_raw(ctx as *mut Arc<Shared>));
        debug!("iokit: HID manager stopped");
    }
}

/// # Safety
/// `ctx` must be the pointer registered in [`run`].
unsafe fn shared_from<'a>(ctx: *mut c_void) -> &'a Shared {
    &*(ctx as *const Arc<Shared>)
}

extern "C" fn device_matched(ctx: *mut c_void, _res: IOReturn, _sender: *mut c_void, device: IOHIDDeviceRef) {
    if ctx.is_null() || device.is_null() {
        return;
    }
    // SAFETY: IOKit passes a live device for the duration of the callback.
    unsafe {
        let desc = describe(device);
        shared_from(ctx).dispatch(HidNotification::Matched(desc));
    }
}

extern "C" fn device_removed(ctx: *mut c_void, _res: IOReturn, _sender: *mut c_void, device: IOHIDDeviceRef) {
    if ctx.is_null() || device.is_null() {
        return;
    }
    // SAFETY: as above.
    unsafe {
        let location_id = number_property(device, "LocationID").map(|v| v as u32);
        shared_from(ctx).dispatch(HidNotification::Removed { location_id });
    }
}

extern "C" fn input_value(ctx: *mut c_void, _res: IOReturn, _sender: *mut c_void, value: IOHIDValueRef) {
    if ctx.is_null() || value.is_null() {
        return;
    }
    // SAFETY: IOKit passes a live value; its element and device outlive it.
    unsafe {
        let element = IOHIDValueGetElement(value);
        if element.is_null() {
            return;
        }
        let device = IOHIDElementGetDevice(element);
        if device.is_null() {
            return;
        }
        let Some(entry_id) = entry_id(device) else {
            return;
        };
        shared_from(ctx).dispatch(HidNotification::Value {
            entry_id,
            element: element_leaf(element),
            value: IOHIDValueGetIntegerValue(value) as i64,
        });
    }
}

unsafe fn describe(device: IOHIDDeviceRef) -> HidDeviceDescriptor<DeviceHandle> {
    let id_prop = |key| number_property(device, key).map_or(0, |v| v as u16);
    HidDeviceDescriptor {
        location_id: number_property(device, "LocationID").map(|v| v as u32),
        entry_id: entry_id(device),
        vendor_id: id_prop("VendorID"),
        product_id: id_prop("ProductID"),
        version: id_prop("VersionNumber"),
        product: string_property(device, "Product"),
        usages: usage_pairs(device),
        elements: elements(device),
        handle: DeviceHandle::retain(device),
    }
}

unsafe fn entry_id(device: IOHIDDeviceRef) -> Option<u64> {
    let service = IOHIDDeviceGetService(device);
    if service == 0 {
        return None;
    }
    let mut id = 0u64;
    (IORegistryEntryGetRegistryEntryID(service, &mut id) == K_IO_RETURN_SUCCESS).then_some(id)
}

unsafe fn property(device: IOHIDDeviceRef, key: &str) -> CFTypeRef {
    let key = CFString::new(key);
    IOHIDDeviceGetProperty(device, key.as_concrete_TypeRef())
}

unsafe fn cf_number(value: CFTypeRef) -> Option<i64> {
    if value.is_null() || CFGetTypeID(value) != CFNumber::type_id() {
        return None;
    }
    CFNumber::wrap_under_get_rule(value as CFNumberRef).to_i64()
}

unsafe fn number_property(device: IOHIDDeviceRef, key: &str) -> Option<i64> {
    cf_number(property(device, key))
}

unsafe fn string_property(device: IOHIDDeviceRef, key: &str) -> Option<String> {
    let value = property(device, key);
    if value.is_null() || CFGetTypeID(value) != CFString::type_id() {
        return None;
    }
    Some(CFString::wrap_under_get_rule(value as CFStringRef).to_string())
}

/// `DeviceUsagePairs`, falling back to the primary usage.
unsafe fn usage_pairs(device: IOHIDDeviceRef) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let pairs = property(device, "DeviceUsagePairs");
    if !pairs.is_null() && CFGetTypeID(pairs) == CFArray::<CFTypeRef>::type_id() {
        let page_key = CFString::new("DeviceUsagePage");
        let usage_key = CFString::new("DeviceUsage");
        for item in array_items(pairs as CFArrayRef) {
            if CFGetTypeID(item) != CFDictionary::<CFTypeRef, CFTypeRef>::type_id() {
                continue;
            }
            let dict = item as CFDictionaryRef;
            let page = cf_number(CFDictionaryGetValue(dict, page_key.as_concrete_TypeRef() as *const c_void));
            let usage = cf_number(CFDictionaryGetValue(dict, usage_key.as_concrete_TypeRef() as *const c_void));
            if let (Some(page), Some(usage)) = (page, usage) {
                out.push((page as u32, usage as u32));
            }
        }
    }
    if out.is_empty() {
        if let (Some(page), Some(usage)) = (
            number_property(device, "PrimaryUsagePage"),
            number_property(device, "PrimaryUsage"),
        ) {
            out.push((page as u32, usage as u32));
        }
    }
    out
}

unsafe fn array_items(array: CFArrayRef) -> Vec<CFTypeRef> {
    if array.is_null() {
        return Vec::new();
    }
    (0..CFArrayGetCount(array))
        .map(|i| CFArrayGetValueAtIndex(array, i) as CFTypeRef)
        .filter(|p| !p.is_null())
        .collect()
}

unsafe fn elements(device: IOHIDDeviceRef) -> Vec<HidElement> {
    let all = IOHIDDeviceCopyMatchingElements(device, std::ptr::null(), K_IOHID_OPTIONS_TYPE_NONE);
    if all.is_null() {
        return Vec::new();
    }
    let out = array_items(all)
        .into_iter()
        .map(|el| element_tree(el as IOHIDElementRef, 0))
        .collect();
    CFRelease(all as CFTypeRef);
    out
}

unsafe fn element_leaf(element: IOHIDElementRef) -> HidElement {
    let clamp = |v: CFIndex| v.clamp(i32::MIN as CFIndex, i32::MAX as CFIndex) as i32;
    HidElement::new(
        IOHIDElementGetCookie(element),
        ElementType::from_raw(IOHIDElementGetType(element)),
        IOHIDElementGetUsagePage(element),
        IOHIDElementGetUsage(element),
    )
    .with_range(
        clamp(IOHIDElementGetLogicalMin(element)),
        clamp(IOHIDElementGetLogicalMax(element)),
    )
}

/// Collections nest a few levels at most; deeper trees are cut off.
const MAX_ELEMENT_DEPTH: usize = 8;

unsafe fn element_tree(element: IOHIDElementRef, depth: usize) -> HidElement {
    let mut el = element_leaf(element);
    if el.kind == ElementType::Collection && depth < MAX_ELEMENT_DEPTH {
        el.children = array_items(IOHIDElementGetChildren(element))
            .into_iter()
            .map(|child| element_tree(child as IOHIDElementRef, depth + 1))
            .collect();
    }
    el
}
