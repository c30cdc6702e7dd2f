//! Normalized key codes.
//!
//! Keyboard keys keep their Windows virtual-key value, so a raw `vkCode`
//! from the hook passes through unchanged. Pointer buttons use their
//! virtual-key values as well; the two scroll directions have no virtual-key
//! value and sit just above the virtual-key byte range.

use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Code reported for one upward wheel tick.
pub const SCROLL_UP_CODE: u32 = 0x100;
/// Code reported for one downward wheel tick.
pub const SCROLL_DOWN_CODE: u32 = 0x101;

macro_rules! key_codes {
    ($($(#[$meta:meta])* $name:ident = $code:literal,)+) => {
        /// A normalized key or pointer identifier.
        ///
        /// Equality and hashing go through [`code`](Self::code), so a
        /// hand-built `Other(0x41)` is the same key as `KeyA`.
        #[derive(Debug, Clone, Copy)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum KeyCode {
            $($(#[$meta])* $name,)+
            /// A virtual-key value without a named variant.
            ///
            /// [`from_code`](Self::from_code) only produces this for
            /// unnamed values.
            Other(u32),
        }

        impl KeyCode {
            /// Map a raw code to its key.
            ///
            /// Every value maps to exactly one key; values without a named
            /// variant become [`KeyCode::Other`].
            pub fn from_code(code: u32) -> Self {
                match code {
                    $($code => KeyCode::$name,)+
                    other => KeyCode::Other(other),
                }
            }

            /// The raw code of this key.
            pub fn code(&self) -> u32 {
                match self {
                    $(KeyCode::$name => $code,)+
                    KeyCode::Other(code) => *code,
                }
            }
        }
    };
}

key_codes! {
    // Pointer
    LeftMouse = 0x01,
    RightMouse = 0x02,
    MiddleMouse = 0x04,
    /// Extended button 1 (usually "back").
    Mouse4 = 0x05,
    /// Extended button 2 (usually "forward").
    Mouse5 = 0x06,
    ScrollUp = 0x100,
    ScrollDown = 0x101,

    // Editing and navigation
    Backspace = 0x08,
    Tab = 0x09,
    Clear = 0x0C,
    Enter = 0x0D,
    Shift = 0x10,
    Control = 0x11,
    Alt = 0x12,
    Pause = 0x13,
    CapsLock = 0x14,
    Escape = 0x1B,
    Space = 0x20,
    PageUp = 0x21,
    PageDown = 0x22,
    End = 0x23,
    Home = 0x24,
    ArrowLeft = 0x25,
    ArrowUp = 0x26,
    ArrowRight = 0x27,
    ArrowDown = 0x28,
    PrintScreen = 0x2C,
    Insert = 0x2D,
    Delete = 0x2E,

    // Digits (top row)
    Num0 = 0x30,
    Num1 = 0x31,
    Num2 = 0x32,
    Num3 = 0x33,
    Num4 = 0x34,
    Num5 = 0x35,
    Num6 = 0x36,
    Num7 = 0x37,
    Num8 = 0x38,
    Num9 = 0x39,

    // Letters
    KeyA = 0x41,
    KeyB = 0x42,
    KeyC = 0x43,
    KeyD = 0x44,
    KeyE = 0x45,
    KeyF = 0x46,
    KeyG = 0x47,
    KeyH = 0x48,
    KeyI = 0x49,
    KeyJ = 0x4A,
    KeyK = 0x4B,
    KeyL = 0x4C,
    KeyM = 0x4D,
    KeyN = 0x4E,
    KeyO = 0x4F,
    KeyP = 0x50,
    KeyQ = 0x51,
    KeyR = 0x52,
    KeyS = 0x53,
    KeyT = 0x54,
    KeyU = 0x55,
    KeyV = 0x56,
    KeyW = 0x57,
    KeyX = 0x58,
    KeyY = 0x59,
    KeyZ = 0x5A,

    MetaLeft = 0x5B,
    MetaRight = 0x5C,
    ContextMenu = 0x5D,
    Sleep = 0x5F,

    // Numpad
    Numpad0 = 0x60,
    Numpad1 = 0x61,
    Numpad2 = 0x62,
    Numpad3 = 0x63,
    Numpad4 = 0x64,
    Numpad5 = 0x65,
    Numpad6 = 0x66,
    Numpad7 = 0x67,
    Numpad8 = 0x68,
    Numpad9 = 0x69,
    NumpadMultiply = 0x6A,
    NumpadAdd = 0x6B,
    NumpadSeparator = 0x6C,
    NumpadSubtract = 0x6D,
    NumpadDecimal = 0x6E,
    NumpadDivide = 0x6F,

    // Function keys
    F1 = 0x70,
    F2 = 0x71,
    F3 = 0x72,
    F4 = 0x73,
    F5 = 0x74,
    F6 = 0x75,
    F7 = 0x76,
    F8 = 0x77,
    F9 = 0x78,
    F10 = 0x79,
    F11 = 0x7A,
    F12 = 0x7B,
    F13 = 0x7C,
    F14 = 0x7D,
    F15 = 0x7E,
    F16 = 0x7F,
    F17 = 0x80,
    F18 = 0x81,
    F19 = 0x82,
    F20 = 0x83,
    F21 = 0x84,
    F22 = 0x85,
    F23 = 0x86,
    F24 = 0x87,

    NumLock = 0x90,
    ScrollLock = 0x91,

    // Sided modifiers (what low-level hooks actually report)
    ShiftLeft = 0xA0,
    ShiftRight = 0xA1,
    ControlLeft = 0xA2,
    ControlRight = 0xA3,
    AltLeft = 0xA4,
    AltRight = 0xA5,

    // Browser and media
    BrowserBack = 0xA6,
    BrowserForward = 0xA7,
    BrowserRefresh = 0xA8,
    BrowserStop = 0xA9,
    BrowserSearch = 0xAA,
    BrowserFavorites = 0xAB,
    BrowserHome = 0xAC,
    VolumeMute = 0xAD,
    VolumeDown = 0xAE,
    VolumeUp = 0xAF,
    MediaNext = 0xB0,
    MediaPrevious = 0xB1,
    MediaStop = 0xB2,
    MediaPlayPause = 0xB3,
    LaunchMail = 0xB4,
    LaunchMediaSelect = 0xB5,
    LaunchApp1 = 0xB6,
    LaunchApp2 = 0xB7,

    // OEM punctuation (US layout names)
    Semicolon = 0xBA,
    Equal = 0xBB,
    Comma = 0xBC,
    Minus = 0xBD,
    Period = 0xBE,
    Slash = 0xBF,
    Grave = 0xC0,
    BracketLeft = 0xDB,
    Backslash = 0xDC,
    BracketRight = 0xDD,
    Quote = 0xDE,
    IntlBackslash = 0xE2,
}

impl KeyCode {
    /// The named variant for this code, if there is one.
    pub fn normalized(&self) -> Self {
        KeyCode::from_code(self.code())
    }

    /// Check if this is one of the pointer identifiers (buttons or wheel).
    pub fn is_mouse(&self) -> bool {
        matches!(
            self.normalized(),
            KeyCode::LeftMouse
                | KeyCode::RightMouse
                | KeyCode::MiddleMouse
                | KeyCode::Mouse4
                | KeyCode::Mouse5
                | KeyCode::ScrollUp
                | KeyCode::ScrollDown
        )
    }

    /// Check if this is a wheel tick.
    ///
    /// Wheel ticks have no hardware release; the service reports a
    /// synthesized `Up` right after each `Down`.
    pub fn is_scroll(&self) -> bool {
        matches!(self.normalized(), KeyCode::ScrollUp | KeyCode::ScrollDown)
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self.normalized(),
            KeyCode::Shift
                | KeyCode::Control
                | KeyCode::Alt
                | KeyCode::ShiftLeft
                | KeyCode::ShiftRight
                | KeyCode::ControlLeft
                | KeyCode::ControlRight
                | KeyCode::AltLeft
                | KeyCode::AltRight
                | KeyCode::MetaLeft
                | KeyCode::MetaRight
        )
    }
}

impl PartialEq for KeyCode {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for KeyCode {}

impl Hash for KeyCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl From<u32> for KeyCode {
    fn from(code: u32) -> Self {
        KeyCode::from_code(code)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.normalized() {
            KeyCode::Other(code) => write!(f, "VK(0x{code:02X})"),
            named => fmt::Debug::fmt(&named, f),
        }
    }
}
