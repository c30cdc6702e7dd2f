//! Capability boundary to the platform hook facility.
//!
//! A [`HookBackend`] installs and removes system hooks. While a hook is
//! installed the backend feeds every raw message it receives into the
//! [`RawEventSink`] it was given, synchronously from its hook procedure, and
//! then forwards the message to the next hook in the platform's chain.

use crate::error::{Error, Result};
use crate::queue::EventSender;
use crate::translate;
use std::fmt;

/// The kind of system hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Keyboard,
    Mouse,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Keyboard => f.write_str("keyboard"),
            HookKind::Mouse => f.write_str("mouse"),
        }
    }
}

/// An installed hook.
///
/// Not `Clone`: removing a hook consumes its handle, so a handle can only be
/// released once.
#[derive(Debug, PartialEq, Eq)]
pub struct HookHandle {
    kind: HookKind,
    raw: isize,
}

impl HookHandle {
    /// Wrap a backend-specific hook identifier.
    pub fn new(kind: HookKind, raw: isize) -> Self {
        Self { kind, raw }
    }

    pub fn kind(&self) -> HookKind {
        self.kind
    }

    /// The backend-specific identifier (an `HHOOK` on Windows).
    pub fn raw(&self) -> isize {
        self.raw
    }
}

/// Entry point for raw messages coming out of a hook procedure.
///
/// Every method translates, enqueues and returns. None of them block or
/// report failure to the caller.
#[derive(Clone)]
pub struct RawEventSink {
    queue: EventSender,
}

impl RawEventSink {
    pub(crate) fn new(queue: EventSender) -> Self {
        Self { queue }
    }

    /// Feed a keyboard hook message.
    #[inline]
    pub fn keyboard(&self, message: u32, vk_code: u32) {
        if let Some(event) = translate::keyboard(message, vk_code) {
            self.queue.push(event);
        }
    }

    /// Feed a mouse hook message.
    #[inline]
    pub fn mouse(&self, message: u32, mouse_data: u32) {
        if let Some(event) = translate::mouse(message, mouse_data) {
            self.queue.push(event);
        }
    }

    /// Report a message that could not be read. Delivered to `on_error`.
    pub fn fault(&self, error: Error) {
        self.queue.push_fault(error);
    }
}

/// Platform hook facility used by the service.
pub trait HookBackend: Send + Sync + 'static {
    /// Whether this backend can install hooks on the running system.
    fn is_supported(&self) -> bool;

    /// Install a hook of `kind` that feeds `sink`.
    ///
    /// On error nothing may be left installed.
    fn install(&self, kind: HookKind, sink: RawEventSink) -> Result<HookHandle>;

    /// Remove a hook. Returns `false` if it was already gone.
    fn remove(&self, handle: HookHandle) -> bool;
}
