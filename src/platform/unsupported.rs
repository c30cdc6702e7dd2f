//! Backend for platforms without global low-level hooks.

use crate::backend::{HookBackend, HookHandle, HookKind, RawEventSink};
use crate::error::{Error, Result};

/// Reports every operation as unsupported.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl UnsupportedBackend {
    pub fn new() -> Self {
        Self
    }
}

impl HookBackend for UnsupportedBackend {
    fn is_supported(&self) -> bool {
        false
    }

    fn install(&self, _kind: HookKind, _sink: RawEventSink) -> Result<HookHandle> {
        Err(Error::PlatformUnsupported(format!(
            "global input hooks require Windows, running on {}",
            std::env::consts::OS
        )))
    }

    fn remove(&self, _handle: HookHandle) -> bool {
        false
    }
}
