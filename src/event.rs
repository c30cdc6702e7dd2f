//! Press/release events delivered to handlers.

use crate::keycode::KeyCode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether a key went down or came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyPressKind {
    /// A key or button was pressed (also reported for key repeat and wheel ticks).
    Down,
    /// A key or button was released.
    Up,
}

/// A normalized input event.
///
/// Events have no identity beyond their fields; key repeat produces
/// several identical `Down` events in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyPressEvent {
    pub kind: KeyPressKind,
    pub code: KeyCode,
}

impl KeyPressEvent {
    /// Create a `Down` event.
    pub fn down(code: KeyCode) -> Self {
        Self {
            kind: KeyPressKind::Down,
            code,
        }
    }

    /// Create an `Up` event.
    pub fn up(code: KeyCode) -> Self {
        Self {
            kind: KeyPressKind::Up,
            code,
        }
    }

    /// Check if this is a `Down` event.
    pub fn is_down(&self) -> bool {
        self.kind == KeyPressKind::Down
    }
}
