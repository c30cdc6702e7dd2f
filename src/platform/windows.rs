//! Windows backend using `SetWindowsHookExW` low-level hooks.
//!
//! Low-level hooks are delivered on the thread that installed them, and only
//! while that thread pumps messages. Call `start` from a thread with a
//! message loop (a UI thread), or run [`MessageLoop::run`] on it.
//!
//! Hook procedures have no user-data pointer, so the sink for each hook kind
//! lives in a process-wide slot. Only one hook per kind can be installed
//! through this backend at a time.

use crate::backend::{HookBackend, HookHandle, HookKind, RawEventSink};
use crate::error::{Error, Result};
use std::ffi::c_void;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, MSG, MSLLHOOKSTRUCT,
    PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx, WH_KEYBOARD_LL, WH_MOUSE_LL,
    WM_QUIT,
};

/// Sink fed by the keyboard hook procedure.
static KEYBOARD_SINK: Mutex<Option<RawEventSink>> = Mutex::new(None);

/// Sink fed by the mouse hook procedure.
static MOUSE_SINK: Mutex<Option<RawEventSink>> = Mutex::new(None);

fn sink_slot(kind: HookKind) -> &'static Mutex<Option<RawEventSink>> {
    match kind {
        HookKind::Keyboard => &KEYBOARD_SINK,
        HookKind::Mouse => &MOUSE_SINK,
    }
}

/// Keyboard hook callback.
///
/// Never waits on the sink slot: if it is being swapped the message is
/// skipped.
unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        if let Ok(slot) = KEYBOARD_SINK.try_lock() {
            if let Some(sink) = slot.as_ref() {
                if lparam.0 == 0 {
                    sink.fault(Error::MalformedPayload(
                        "keyboard hook received a null KBDLLHOOKSTRUCT".into(),
                    ));
                } else {
                    // SAFETY: for HC_ACTION, lparam points to a KBDLLHOOKSTRUCT.
                    let kb = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
                    sink.keyboard(wparam.0 as u32, kb.vkCode);
                }
            }
        }
    }

    unsafe { CallNextHookEx(None::<HHOOK>, code, wparam, lparam) }
}

/// Mouse hook callback.
unsafe extern "system" fn mouse_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        if let Ok(slot) = MOUSE_SINK.try_lock() {
            if let Some(sink) = slot.as_ref() {
                if lparam.0 == 0 {
                    sink.fault(Error::MalformedPayload(
                        "mouse hook received a null MSLLHOOKSTRUCT".into(),
                    ));
                } else {
                    // SAFETY: for HC_ACTION, lparam points to a MSLLHOOKSTRUCT.
                    let mouse = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };
                    sink.mouse(wparam.0 as u32, mouse.mouseData);
                }
            }
        }
    }

    unsafe { CallNextHookEx(None::<HHOOK>, code, wparam, lparam) }
}

/// Low-level keyboard and mouse hooks.
#[derive(Debug, Default)]
pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl HookBackend for WindowsBackend {
    fn is_supported(&self) -> bool {
        true
    }

    fn install(&self, kind: HookKind, sink: RawEventSink) -> Result<HookHandle> {
        let mut slot = sink_slot(kind)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(Error::HookInstall {
                kind,
                reason: "another service already owns this hook".into(),
            });
        }
        *slot = Some(sink);

        let result = unsafe {
            match kind {
                HookKind::Keyboard => {
                    SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), None, 0)
                }
                HookKind::Mouse => SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), None, 0),
            }
        };

        match result {
            Ok(hook) => {
                log::debug!("installed {kind} hook");
                Ok(HookHandle::new(kind, hook.0 as isize))
            }
            Err(e) => {
                *slot = None;
                Err(Error::HookInstall {
                    kind,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn remove(&self, handle: HookHandle) -> bool {
        let kind = handle.kind();
        let hook = HHOOK(handle.raw() as *mut c_void);
        let removed = unsafe { UnhookWindowsHookEx(hook) }.is_ok();

        *sink_slot(kind)
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;

        if removed {
            log::debug!("removed {kind} hook");
        }
        removed
    }
}

/// A Win32 message loop on the current thread.
///
/// Not `Send`: it belongs to the thread that created it.
pub struct MessageLoop {
    thread_id: u32,
    _not_send: PhantomData<*const ()>,
}

impl MessageLoop {
    /// Bind a message loop to the calling thread.
    pub fn current() -> Self {
        Self {
            thread_id: unsafe { GetCurrentThreadId() },
            _not_send: PhantomData,
        }
    }

    /// A handle that can end [`run`](Self::run) from any thread.
    pub fn handle(&self) -> MessageLoopHandle {
        MessageLoopHandle {
            thread_id: self.thread_id,
        }
    }

    /// Pump messages until `WM_QUIT` is received.
    pub fn run(&self) {
        let mut msg = MSG::default();
        unsafe { while GetMessageW(&mut msg, None, 0, 0).as_bool() {} }
    }
}

/// Ends a [`MessageLoop`] from another thread.
#[derive(Debug, Clone, Copy)]
pub struct MessageLoopHandle {
    thread_id: u32,
}

impl MessageLoopHandle {
    /// Post `WM_QUIT` to the loop's thread. Returns `false` if posting failed.
    pub fn quit(&self) -> bool {
        unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }.is_ok()
    }
}
