//! Linux evdev bindings over raw `ioctl`/`poll`.
#![cfg(target_os = "linux")]

use super::caps::{BitSet, Capabilities};
use super::codes::{AXIS_MAP, ABS_MAX, EV_ABS, EV_FF, EV_KEY, EV_MAX, FF_MAX, FF_RUMBLE, KEY_MAX};
use super::node::{EvdevNode, NodeSource, RawInputEvent, ReadStatus, Readiness, RumbleEffect};
use crate::device::AxisInfo;
use crate::identity::DeviceIds;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::mem::size_of;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const EVDEV_IOCTL_TYPE: u8 = b'E';

const fn ioctl_code(direction: u32, kind: u8, nr: u8, size: usize) -> libc::c_ulong {
    ((direction << IOC_DIRSHIFT)
        | ((kind as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)) as libc::c_ulong
}

const EVIOCGID: libc::c_ulong = ioctl_code(IOC_READ, EVDEV_IOCTL_TYPE, 0x02, size_of::<InputId>());
const EVIOCSFF: libc::c_ulong = ioctl_code(IOC_WRITE, EVDEV_IOCTL_TYPE, 0x80, size_of::<FfEffect>());
const EVIOCRMFF: libc::c_ulong =
    ioctl_code(IOC_WRITE, EVDEV_IOCTL_TYPE, 0x81, size_of::<libc::c_int>());

fn eviocgname(len: usize) -> libc::c_ulong {
    ioctl_code(IOC_READ, EVDEV_IOCTL_TYPE, 0x06, len)
}

fn eviocgbit(ev: u16, len: usize) -> libc::c_ulong {
    ioctl_code(IOC_READ, EVDEV_IOCTL_TYPE, 0x20 + ev as u8, len)
}

fn eviocgabs(abs: u16) -> libc::c_ulong {
    ioctl_code(IOC_READ, EVDEV_IOCTL_TYPE, 0x40 + abs as u8, size_of::<InputAbsInfo>())
}

#[repr(C)]
#[derive(Default)]
struct InputId {
    bustype: u16,
    vendor: u16,
    product: u16,
    version: u16,
}

#[repr(C)]
#[derive(Default)]
struct InputAbsInfo {
    value: i32,
    minimum: i32,
    maximum: i32,
    fuzz: i32,
    flat: i32,
    resolution: i32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct FfRumble {
    strong_magnitude: u16,
    weak_magnitude: u16,
}

/// Shape of the largest union member (`ff_periodic_effect`), for size and alignment.
#[repr(C)]
#[derive(Clone, Copy)]
struct FfPeriodicLayout {
    fields: [u16; 9],
    custom_len: u32,
    custom_data: *const i16,
}

#[repr(C)]
#[derive(Clone, Copy)]
union FfUnion {
    rumble: FfRumble,
    periodic: FfPeriodicLayout,
}

#[repr(C)]
struct FfEffect {
    kind: u16,
    id: i16,
    direction: u16,
    trigger_button: u16,
    trigger_interval: u16,
    replay_length: u16,
    replay_delay: u16,
    u: FfUnion,
}

/// Size of `struct input_event`: a `timeval` then type, code, value.
const TIMEVAL_LEN: usize = size_of::<libc::timeval>();
const INPUT_EVENT_LEN: usize = TIMEVAL_LEN + 8;

fn cvt(rc: libc::c_int) -> io::Result<libc::c_int> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc)
    }
}

fn parse_c_string(bytes: &[u8]) -> String {
    let nul_idx = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..nul_idx]).trim().to_string()
}

/// Trailing number of `eventN`, for natural ordering.
fn event_index(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("event")?
        .parse()
        .ok()
}

pub struct LinuxNodeSource {
    dir: PathBuf,
}

impl LinuxNodeSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl NodeSource for LinuxNodeSource {
    type Node = LinuxNode;

    fn scan(&mut self) -> io::Result<Vec<PathBuf>> {
        let mut paths: Vec<(u32, PathBuf)> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter_map(|p| event_index(&p).map(|n| (n, p)))
            .collect();
        paths.sort();
        Ok(paths.into_iter().map(|(_, p)| p).collect())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open(&mut self, path: &Path) -> io::Result<LinuxNode> {
        let flags = libc::O_NONBLOCK | libc::O_CLOEXEC;
        match OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(flags)
            .open(path)
        {
            Ok(file) => Ok(LinuxNode {
                file,
                writable: true,
            }),
            Err(_) => {
                let file = OpenOptions::new().read(true).custom_flags(flags).open(path)?;
                Ok(LinuxNode {
                    file,
                    writable: false,
                })
            }
        }
    }

    fn wait(&mut self, nodes: &[&LinuxNode], timeout_ms: i32) -> io::Result<Vec<Readiness>> {
        let mut fds: Vec<libc::pollfd> = nodes
            .iter()
            .map(|n| libc::pollfd {
                fd: n.file.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();
        // SAFETY: `fds` is a live, correctly sized pollfd array.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        cvt(rc)?;
        Ok(fds
            .iter()
            .map(|p| {
                if p.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                    Readiness::Failed
                } else if p.revents & libc::POLLIN != 0 {
                    Readiness::Readable
                } else {
                    Readiness::Idle
                }
            })
            .collect())
    }
}

/// One open `/dev/input/eventN` node. Dropping it closes the descriptor.
pub struct LinuxNode {
    file: File,
    writable: bool,
}

impl LinuxNode {
    fn bits(&self, ev: u16, max: u16) -> io::Result<BitSet> {
        let mut set = BitSet::for_max(max);
        let bytes = set.as_mut_bytes();
        // SAFETY: the kernel writes at most `bytes.len()` bytes.
        cvt(unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                eviocgbit(ev, bytes.len()) as _,
                bytes.as_mut_ptr(),
            )
        })?;
        Ok(set)
    }

    fn abs_info(&self, abs: u16) -> io::Result<AxisInfo> {
        let mut info = InputAbsInfo::default();
        // SAFETY: `info` matches `struct input_absinfo`.
        cvt(unsafe { libc::ioctl(self.file.as_raw_fd(), eviocgabs(abs) as _, &mut info) })?;
        Ok(AxisInfo {
            min: info.minimum,
            max: info.maximum,
        })
    }
}

impl EvdevNode for LinuxNode {
    fn capabilities(&mut self) -> io::Result<Capabilities> {
        let ev = self.bits(0, EV_MAX)?;
        let keys = if ev.test(EV_KEY) {
            self.bits(EV_KEY, KEY_MAX).unwrap_or_default()
        } else {
            BitSet::for_max(KEY_MAX)
        };
        let abs = if ev.test(EV_ABS) {
            self.bits(EV_ABS, ABS_MAX).unwrap_or_default()
        } else {
            BitSet::for_max(ABS_MAX)
        };
        let ff = if ev.test(EV_FF) {
            self.bits(EV_FF, FF_MAX).unwrap_or_default()
        } else {
            BitSet::for_max(FF_MAX)
        };
        let abs_ranges = AXIS_MAP
            .iter()
            .filter(|&&(raw, _)| abs.test(raw))
            .filter_map(|&(raw, _)| self.abs_info(raw).ok().map(|i| (raw, i)))
            .collect();
        Ok(Capabilities {
            ev,
            keys,
            abs,
            ff,
            abs_ranges,
        })
    }

    fn ids(&mut self) -> io::Result<DeviceIds> {
        let mut id = InputId::default();
        // SAFETY: `id` matches `struct input_id`.
        cvt(unsafe { libc::ioctl(self.file.as_raw_fd(), EVIOCGID as _, &mut id) })?;
        Ok(DeviceIds::new(id.bustype, id.vendor, id.product, id.version))
    }

    fn name(&mut self) -> io::Result<String> {
        let mut buf = [0u8; 256];
        // SAFETY: the kernel writes at most `buf.len()` bytes.
        cvt(unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                eviocgname(buf.len()) as _,
                buf.as_mut_ptr(),
            )
        })?;
        Ok(parse_c_string(&buf))
    }

    fn writable(&self) -> bool {
        self.writable
    }

    fn read_events(&mut self, out: &mut Vec<RawInputEvent>) -> io::Result<ReadStatus> {
        let mut buf = [0u8; INPUT_EVENT_LEN * 64];
        loop {
            let n = match self.file.read(&mut buf) {
                Ok(0) => return Ok(ReadStatus::Closed),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadStatus::Drained),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for rec in buf[..n].chunks_exact(INPUT_EVENT_LEN) {
                let body = &rec[TIMEVAL_LEN..];
                out.push(RawInputEvent::new(
                    u16::from_ne_bytes([body[0], body[1]]),
                    u16::from_ne_bytes([body[2], body[3]]),
                    i32::from_ne_bytes([body[4], body[5], body[6], body[7]]),
                ));
            }
        }
    }

    fn upload_rumble(&mut self, effect: RumbleEffect) -> io::Result<i16> {
        let mut fx = FfEffect {
            kind: FF_RUMBLE,
            id: -1,
            direction: 0,
            trigger_button: 0,
            trigger_interval: 0,
            replay_length: effect.duration_ms,
            replay_delay: 0,
            u: FfUnion {
                periodic: FfPeriodicLayout {
                    fields: [0; 9],
                    custom_len: 0,
                    custom_data: std::ptr::null(),
                },
            },
        };
        fx.u.rumble = FfRumble {
            strong_magnitude: effect.strong,
            weak_magnitude: effect.weak,
        };
        // SAFETY: `fx` matches `struct ff_effect`; the kernel writes back `id`.
        cvt(unsafe { libc::ioctl(self.file.as_raw_fd(), EVIOCSFF as _, &mut fx) })?;
        Ok(fx.id)
    }

    fn play(&mut self, id: i16, on: bool) -> io::Result<()> {
        let mut rec = [0u8; INPUT_EVENT_LEN];
        let body = &mut rec[TIMEVAL_LEN..];
        body[0..2].copy_from_slice(&EV_FF.to_ne_bytes());
        body[2..4].copy_from_slice(&(id as u16).to_ne_bytes());
        body[4..8].copy_from_slice(&i32::from(on).to_ne_bytes());
        self.file.write_all(&rec)
    }

    fn erase(&mut self, id: i16) -> io::Result<()> {
        // SAFETY: EVIOCRMFF takes the effect id by value.
        cvt(unsafe { libc::ioctl(self.file.as_raw_fd(), EVIOCRMFF as _, libc::c_int::from(id)) })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ioctl_numbers_match_kernel_headers() {
        assert_eq!(EVIOCGID, 0x8008_4502);
        assert_eq!(EVIOCRMFF, 0x4004_4581);
        assert_eq!(eviocgbit(0, 4), 0x8004_4520);
        assert_eq!(eviocgabs(0), 0x8018_4540);
    }

    #[test]
    fn ff_effect_matches_kernel_size() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(size_of::<FfEffect>(), 48);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(size_of::<FfEffect>(), 44);
    }

    #[test]
    fn event_nodes_sort_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["event10", "event2", "mouse0", "js0"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let mut src = LinuxNodeSource::new(dir.path());
        let names: Vec<String> = src
            .scan()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["event2", "event10"]);
    }
}
