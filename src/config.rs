//! Service configuration.

use crate::backend::HookKind;
use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default name of the consumer thread.
pub const DEFAULT_THREAD_NAME: &str = "globalhook-consumer";

/// Which hooks to install and how to name the consumer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct HookConfig {
    pub capture_keyboard: bool,
    pub capture_mouse: bool,
    pub thread_name: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            capture_keyboard: true,
            capture_mouse: true,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl HookConfig {
    /// Default configuration: both hooks.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture_keyboard(mut self, enabled: bool) -> Self {
        self.capture_keyboard = enabled;
        self
    }

    pub fn capture_mouse(mut self, enabled: bool) -> Self {
        self.capture_mouse = enabled;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Check that the configuration can be started.
    pub fn validate(&self) -> Result<()> {
        if !self.capture_keyboard && !self.capture_mouse {
            return Err(Error::InvalidConfig(
                "at least one of keyboard or mouse capture must be enabled".into(),
            ));
        }
        if self.thread_name.is_empty() || self.thread_name.contains('\0') {
            return Err(Error::InvalidConfig(
                "thread name must be non-empty and free of NUL bytes".into(),
            ));
        }
        Ok(())
    }

    /// Hooks to install, in installation order.
    pub fn hook_kinds(&self) -> Vec<HookKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.capture_keyboard {
            kinds.push(HookKind::Keyboard);
        }
        if self.capture_mouse {
            kinds.push(HookKind::Mouse);
        }
        kinds
    }
}
