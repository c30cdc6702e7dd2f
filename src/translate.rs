//! Translation of raw hook messages into [`KeyPressEvent`]s.
//!
//! The functions here are pure and allocation-free so they can run inside
//! the hook procedure itself. Message identifiers are the Windows `WM_*`
//! values; they are redefined in [`message`] so translation builds and tests
//! on every platform.

use crate::event::KeyPressEvent;
use crate::keycode::KeyCode;

/// Raw message identifiers delivered with low-level hook callbacks.
pub mod message {
    pub const WM_KEYDOWN: u32 = 0x0100;
    pub const WM_KEYUP: u32 = 0x0101;
    pub const WM_SYSKEYDOWN: u32 = 0x0104;
    pub const WM_SYSKEYUP: u32 = 0x0105;
    pub const WM_NCXBUTTONDOWN: u32 = 0x00AB;
    pub const WM_NCXBUTTONUP: u32 = 0x00AC;
    pub const WM_MOUSEMOVE: u32 = 0x0200;
    pub const WM_LBUTTONDOWN: u32 = 0x0201;
    pub const WM_LBUTTONUP: u32 = 0x0202;
    pub const WM_RBUTTONDOWN: u32 = 0x0204;
    pub const WM_RBUTTONUP: u32 = 0x0205;
    pub const WM_MBUTTONDOWN: u32 = 0x0207;
    pub const WM_MBUTTONUP: u32 = 0x0208;
    pub const WM_MOUSEWHEEL: u32 = 0x020A;
    pub const WM_XBUTTONDOWN: u32 = 0x020B;
    pub const WM_XBUTTONUP: u32 = 0x020C;
    pub const WM_MOUSEHWHEEL: u32 = 0x020E;
}

use message::*;

/// `mouseData` high word identifying extended button 1.
pub const XBUTTON1: u16 = 0x0001;
/// `mouseData` high word identifying extended button 2.
pub const XBUTTON2: u16 = 0x0002;

/// High word of a `mouseData` value.
#[inline]
pub fn hi_word(data: u32) -> u16 {
    ((data >> 16) & 0xFFFF) as u16
}

/// High word of a `mouseData` value, read as a signed wheel delta.
#[inline]
pub fn hi_word_signed(data: u32) -> i16 {
    hi_word(data) as i16
}

/// Translate a keyboard hook message.
///
/// Returns `None` for messages that are not key transitions.
#[inline]
pub fn keyboard(message: u32, vk_code: u32) -> Option<KeyPressEvent> {
    match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyPressEvent::down(KeyCode::from_code(vk_code))),
        WM_KEYUP | WM_SYSKEYUP => Some(KeyPressEvent::up(KeyCode::from_code(vk_code))),
        _ => None,
    }
}

/// Translate a mouse hook message.
///
/// `mouse_data` is the `mouseData` field of the hook struct: it carries the
/// extended button for `WM_XBUTTON*` and the wheel delta for
/// `WM_MOUSEWHEEL`. Movement, horizontal wheel and unknown extended buttons
/// produce no event, and neither does a zero wheel delta.
#[inline]
pub fn mouse(message: u32, mouse_data: u32) -> Option<KeyPressEvent> {
    match message {
        WM_LBUTTONDOWN => Some(KeyPressEvent::down(KeyCode::LeftMouse)),
        WM_LBUTTONUP => Some(KeyPressEvent::up(KeyCode::LeftMouse)),
        WM_RBUTTONDOWN => Some(KeyPressEvent::down(KeyCode::RightMouse)),
        WM_RBUTTONUP => Some(KeyPressEvent::up(KeyCode::RightMouse)),
        WM_MBUTTONDOWN => Some(KeyPressEvent::down(KeyCode::MiddleMouse)),
        WM_MBUTTONUP => Some(KeyPressEvent::up(KeyCode::MiddleMouse)),
        WM_XBUTTONDOWN | WM_NCXBUTTONDOWN => xbutton(mouse_data).map(KeyPressEvent::down),
        WM_XBUTTONUP | WM_NCXBUTTONUP => xbutton(mouse_data).map(KeyPressEvent::up),
        WM_MOUSEWHEEL => {
            let delta = hi_word_signed(mouse_data);
            if delta > 0 {
                Some(KeyPressEvent::down(KeyCode::ScrollUp))
            } else if delta < 0 {
                Some(KeyPressEvent::down(KeyCode::ScrollDown))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn xbutton(mouse_data: u32) -> Option<KeyCode> {
    match hi_word(mouse_data) {
        XBUTTON1 => Some(KeyCode::Mouse4),
        XBUTTON2 => Some(KeyCode::Mouse5),
        _ => None,
    }
}
