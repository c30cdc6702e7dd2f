//! In-memory hook backend for tests.
//!
//! Lets tests drive the service with synthetic raw messages without OS hooks
//! or a message loop. Clones share state, so keep one clone to inject and
//! inspect while the service owns another.

use crate::backend::{HookBackend, HookHandle, HookKind, RawEventSink};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct MockState {
    unsupported: bool,
    failing: Vec<HookKind>,
    installed: HashMap<HookKind, (isize, RawEventSink)>,
    next_id: isize,
    installs: usize,
    removes: usize,
}

/// A [`HookBackend`] whose hooks are fed by the test.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// A supported backend where every install succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that reports itself as unsupported.
    pub fn unsupported() -> Self {
        let backend = Self::new();
        backend.lock().unsupported = true;
        backend
    }

    /// Make every later install of `kind` fail.
    pub fn fail_install(self, kind: HookKind) -> Self {
        self.lock().failing.push(kind);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Successful installs so far.
    pub fn install_count(&self) -> usize {
        self.lock().installs
    }

    /// Successful removals so far.
    pub fn remove_count(&self) -> usize {
        self.lock().removes
    }

    pub fn is_installed(&self, kind: HookKind) -> bool {
        self.lock().installed.contains_key(&kind)
    }

    /// Kinds currently installed, keyboard first.
    pub fn installed(&self) -> Vec<HookKind> {
        let state = self.lock();
        [HookKind::Keyboard, HookKind::Mouse]
            .into_iter()
            .filter(|kind| state.installed.contains_key(kind))
            .collect()
    }

    fn sink(&self, kind: HookKind) -> Option<RawEventSink> {
        self.lock().installed.get(&kind).map(|(_, sink)| sink.clone())
    }

    /// Feed a keyboard message as the hook procedure would.
    ///
    /// Returns `false` if no keyboard hook is installed.
    pub fn inject_keyboard(&self, message: u32, vk_code: u32) -> bool {
        match self.sink(HookKind::Keyboard) {
            Some(sink) => {
                sink.keyboard(message, vk_code);
                true
            }
            None => false,
        }
    }

    /// Feed a mouse message as the hook procedure would.
    ///
    /// Returns `false` if no mouse hook is installed.
    pub fn inject_mouse(&self, message: u32, mouse_data: u32) -> bool {
        match self.sink(HookKind::Mouse) {
            Some(sink) => {
                sink.mouse(message, mouse_data);
                true
            }
            None => false,
        }
    }

    /// Report a fault through whichever hook is installed.
    pub fn inject_fault(&self, error: Error) -> bool {
        let sink = self
            .sink(HookKind::Keyboard)
            .or_else(|| self.sink(HookKind::Mouse));
        match sink {
            Some(sink) => {
                sink.fault(error);
                true
            }
            None => false,
        }
    }
}

impl HookBackend for MockBackend {
    fn is_supported(&self) -> bool {
        !self.lock().unsupported
    }

    fn install(&self, kind: HookKind, sink: RawEventSink) -> Result<HookHandle> {
        let mut state = self.lock();
        if state.unsupported {
            return Err(Error::PlatformUnsupported("mock backend".into()));
        }
        if state.failing.contains(&kind) {
            return Err(Error::HookInstall {
                kind,
                reason: "mock install failure".into(),
            });
        }
        if state.installed.contains_key(&kind) {
            return Err(Error::HookInstall {
                kind,
                reason: "already installed".into(),
            });
        }

        state.next_id += 1;
        let id = state.next_id;
        state.installed.insert(kind, (id, sink));
        state.installs += 1;
        Ok(HookHandle::new(kind, id))
    }

    fn remove(&self, handle: HookHandle) -> bool {
        let mut state = self.lock();
        match state.installed.get(&handle.kind()) {
            Some((id, _)) if *id == handle.raw() => {
                state.installed.remove(&handle.kind());
                state.removes += 1;
                true
            }
            _ => false,
        }
    }
}
