//! The primitives the evdev decoder needs from the OS.
//!
//! [`NodeSource`] enumerates and opens `/dev/input/event*` style nodes and
//! multiplexes readiness across them; [`EvdevNode`] is one open node. The Linux
//! implementation lives in `sys`; tests drive the decoder with in-memory fakes.

use super::caps::Capabilities;
use crate::identity::DeviceIds;
use std::io;
use std::path::{Path, PathBuf};

/// One `struct input_event`, minus the kernel timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawInputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawInputEvent {
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }
}

/// What a drain of a node's pending input ended on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    /// The node would block; it is still alive.
    Drained,
    /// End of file: the node is gone.
    Closed,
}

/// Per-node result of a readiness wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Readiness {
    #[default]
    Idle,
    Readable,
    /// `POLLERR`, `POLLHUP` or `POLLNVAL`.
    Failed,
}

/// Rumble effect parameters in kernel units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RumbleEffect {
    pub strong: u16,
    pub weak: u16,
    pub duration_ms: u16,
}

pub trait EvdevNode: Send {
    /// Capability bitmaps plus `absinfo` ranges.
    fn capabilities(&mut self) -> io::Result<Capabilities>;

    /// Bus/vendor/product/version from `EVIOCGID`.
    fn ids(&mut self) -> io::Result<DeviceIds>;

    /// Product name from `EVIOCGNAME`.
    fn name(&mut self) -> io::Result<String>;

    /// `false` when the node was opened read-only.
    fn writable(&self) -> bool;

    /// Read every pending input record into `out`.
    ///
    /// Returns [`ReadStatus::Closed`] on end of file. Any error other than
    /// would-block is returned as `Err`.
    fn read_events(&mut self, out: &mut Vec<RawInputEvent>) -> io::Result<ReadStatus>;

    /// Upload a new rumble effect. Returns the kernel effect id.
    fn upload_rumble(&mut self, effect: RumbleEffect) -> io::Result<i16>;

    /// Start (`true`) or stop (`false`) an uploaded effect.
    fn play(&mut self, id: i16, on: bool) -> io::Result<()>;

    /// Free the kernel slot of an uploaded effect.
    fn erase(&mut self, id: i16) -> io::Result<()>;
}

pub trait NodeSource: Send {
    type Node: EvdevNode;

    /// Candidate node paths, sorted.
    fn scan(&mut self) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` still exists.
    fn exists(&self, path: &Path) -> bool;

    /// Open a node non-blocking, read-write if possible, read-only otherwise.
    fn open(&mut self, path: &Path) -> io::Result<Self::Node>;

    /// Wait up to `timeout_ms` (negative blocks) for any node to become readable.
    /// The result has one entry per node, in order.
    fn wait(&mut self, nodes: &[&Self::Node], timeout_ms: i32) -> io::Result<Vec<Readiness>>;
}
