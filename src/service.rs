//! Lifecycle of the hook service.
//!
//! ```text
//! NotStarted --start--> Running --stop--> Stopping --> NotStarted
//!      \                   \
//!       `----dispose-------`---------------------------> Disposed
//! ```
//!
//! Teardown never runs while the state lock is held. A caller that finds the
//! service `Stopping` waits for the in-flight teardown to finish.

use crate::backend::{HookBackend, HookHandle, RawEventSink};
use crate::config::HookConfig;
use crate::consumer::{self, CancelHandle, ConsumerWorker};
use crate::dispatch::{Dispatch, ExecutionContext};
use crate::error::{Error, Result};
use crate::handler::InputHandler;
use crate::platform::PlatformBackend;
use crate::queue::{self, EventSender};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tokio::sync::watch;

/// Lifecycle state of an [`InputHookService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    NotStarted,
    Running,
    Stopping,
    Disposed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::NotStarted => "not started",
            ServiceState::Running => "running",
            ServiceState::Stopping => "stopping",
            ServiceState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Resources owned by one `Running` period.
struct Session {
    hooks: Vec<HookHandle>,
    queue: EventSender,
    cancel: CancelHandle,
    worker: ConsumerWorker,
}

struct Inner {
    state: ServiceState,
    session: Option<Session>,
    dispose_requested: bool,
}

/// Captures global keyboard and mouse input and delivers press/release
/// notifications to an [`InputHandler`].
///
/// The hook procedure only translates and enqueues. Handlers run on a
/// dedicated consumer thread, or on the [`ExecutionContext`] given to
/// [`start`](Self::start), so slow handlers never delay system input.
///
/// # Example
///
/// ```no_run
/// use globalhook::{Handlers, InputHookService};
///
/// let service = InputHookService::new(
///     Handlers::new()
///         .on_key_down(|code| println!("down {code}"))
///         .on_key_up(|code| println!("up {code}")),
/// );
/// service.start(None)?;
/// // ... pump messages on this thread ...
/// service.stop()?;
/// # Ok::<(), globalhook::Error>(())
/// ```
pub struct InputHookService<B: HookBackend = PlatformBackend> {
    backend: B,
    handler: Arc<dyn InputHandler>,
    config: HookConfig,
    inner: Mutex<Inner>,
    changed: Condvar,
    state_tx: watch::Sender<ServiceState>,
    consumer: Mutex<Option<ThreadId>>,
}

impl InputHookService<PlatformBackend> {
    /// Create a service on the native hook backend.
    pub fn new<H: InputHandler>(handler: H) -> Self {
        Self::with_backend(PlatformBackend::default(), handler)
    }
}

impl<B: HookBackend> InputHookService<B> {
    /// Create a service on a specific backend.
    pub fn with_backend<H: InputHandler>(backend: B, handler: H) -> Self {
        let (state_tx, _) = watch::channel(ServiceState::NotStarted);
        Self {
            backend,
            handler: Arc::new(handler),
            config: HookConfig::default(),
            inner: Mutex::new(Inner {
                state: ServiceState::NotStarted,
                session: None,
                dispose_requested: false,
            }),
            changed: Condvar::new(),
            state_tx,
            consumer: Mutex::new(None),
        }
    }

    /// Replace the configuration. Takes effect at the next `start`.
    pub fn with_config(mut self, config: HookConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        *self.state_tx.borrow()
    }

    /// Check if hooks are installed and events are flowing.
    pub fn is_running(&self) -> bool {
        self.state() == ServiceState::Running
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<ServiceState> {
        self.state_tx.subscribe()
    }

    /// Install the hooks and start delivering events.
    ///
    /// With `Some(context)` every callback is handed to the context instead
    /// of running on the consumer thread. Calling `start` while running does
    /// nothing.
    ///
    /// On Windows the calling thread must pump messages for the hooks to
    /// fire.
    pub fn start(&self, context: Option<ExecutionContext>) -> Result<()> {
        if !self.backend.is_supported() {
            return Err(Error::PlatformUnsupported(format!(
                "no global hook support on {}",
                std::env::consts::OS
            )));
        }
        if self.state() == ServiceState::Disposed {
            return Err(Error::Disposed);
        }
        if self.on_consumer_thread() {
            return Err(Error::Reentrant("start"));
        }

        let mut inner = self.wait_idle(self.lock());
        match inner.state {
            ServiceState::Disposed => return Err(Error::Disposed),
            ServiceState::Running => return Ok(()),
            _ => {}
        }
        self.config.validate()?;

        let (queue, receiver) = queue::unbounded();
        let (cancel, token) = consumer::cancellation();
        let dispatch = Dispatch::new(Arc::clone(&self.handler), context);
        let worker = ConsumerWorker::spawn(&self.config.thread_name, receiver, token, dispatch)?;
        self.set_consumer(Some(worker.thread_id()));

        let mut session = Session {
            hooks: Vec::with_capacity(2),
            queue,
            cancel,
            worker,
        };

        for kind in self.config.hook_kinds() {
            match self
                .backend
                .install(kind, RawEventSink::new(session.queue.clone()))
            {
                Ok(handle) => session.hooks.push(handle),
                Err(err) => {
                    log::debug!("start aborted: {err}");
                    self.set_state(&mut inner, ServiceState::Stopping);
                    drop(inner);

                    self.teardown_blocking(session);
                    self.finish_stop(&mut self.lock());
                    return Err(err);
                }
            }
        }

        inner.session = Some(session);
        self.set_state(&mut inner, ServiceState::Running);
        Ok(())
    }

    /// Remove the hooks, deliver everything already captured, and wait for
    /// the consumer thread to exit.
    ///
    /// Returns [`Error::Reentrant`] when called from a handler running on
    /// the consumer thread.
    pub fn stop(&self) -> Result<()> {
        if self.state() == ServiceState::Disposed {
            return Err(Error::Disposed);
        }
        if self.on_consumer_thread() {
            return Err(Error::Reentrant("stop"));
        }

        let mut inner = self.wait_idle(self.lock());
        match inner.state {
            ServiceState::Disposed => return Err(Error::Disposed),
            ServiceState::Running => {}
            _ => return Ok(()),
        }
        let session = self.begin_stop(&mut inner);
        drop(inner);

        if let Some(session) = session {
            self.teardown_blocking(session);
        }
        self.finish_stop(&mut self.lock());
        Ok(())
    }

    /// Like [`stop`](Self::stop), but waits for the consumer without
    /// blocking the calling task.
    ///
    /// If the returned future is dropped before it completes, the stop is
    /// still finished: the dropping thread blocks until the consumer exits.
    pub async fn stop_async(&self) -> Result<()> {
        if self.state() == ServiceState::Disposed {
            return Err(Error::Disposed);
        }
        if self.on_consumer_thread() {
            return Err(Error::Reentrant("stop_async"));
        }

        let session = loop {
            {
                let mut inner = self.lock();
                match inner.state {
                    ServiceState::Disposed => return Err(Error::Disposed),
                    ServiceState::NotStarted => return Ok(()),
                    ServiceState::Running => break self.begin_stop(&mut inner),
                    ServiceState::Stopping => {}
                }
            }
            self.settled().await;
        };

        let mut pending = PendingStop {
            service: self,
            worker: session.map(|session| self.release(session)),
        };
        if let Some(worker) = pending.worker.as_mut() {
            worker.exited().await;
        }
        drop(pending);
        Ok(())
    }

    /// Stop if running and release everything for good.
    ///
    /// Never fails and may be called any number of times. Every later
    /// `start`, `stop` or `stop_async` returns [`Error::Disposed`].
    pub fn dispose(&self) {
        let on_consumer = self.on_consumer_thread();
        let mut inner = self.lock();
        loop {
            match inner.state {
                ServiceState::Disposed => return,
                ServiceState::NotStarted => {
                    self.set_state(&mut inner, ServiceState::Disposed);
                    return;
                }
                ServiceState::Stopping if on_consumer => {
                    // Whoever is stopping is waiting for this thread.
                    inner.dispose_requested = true;
                    return;
                }
                ServiceState::Stopping => {
                    inner = self
                        .changed
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                ServiceState::Running => break,
            }
        }

        inner.dispose_requested = true;
        let session = self.begin_stop(&mut inner);
        drop(inner);

        if let Some(session) = session {
            self.teardown_blocking(session);
        }
        self.finish_stop(&mut self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_idle<'a>(&self, mut inner: MutexGuard<'a, Inner>) -> MutexGuard<'a, Inner> {
        while inner.state == ServiceState::Stopping {
            inner = self
                .changed
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        inner
    }

    async fn settled(&self) {
        let mut rx = self.state_tx.subscribe();
        let _ = rx
            .wait_for(|state| *state != ServiceState::Stopping)
            .await;
    }

    fn set_state(&self, inner: &mut Inner, state: ServiceState) {
        log::debug!("hook service {} -> {}", inner.state, state);
        inner.state = state;
        self.state_tx.send_replace(state);
        self.changed.notify_all();
    }

    fn set_consumer(&self, id: Option<ThreadId>) {
        *self.consumer.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }

    fn on_consumer_thread(&self) -> bool {
        let consumer = self.consumer.lock().unwrap_or_else(PoisonError::into_inner);
        *consumer == Some(thread::current().id())
    }

    fn begin_stop(&self, inner: &mut Inner) -> Option<Session> {
        self.set_state(inner, ServiceState::Stopping);
        inner.session.take()
    }

    fn finish_stop(&self, inner: &mut Inner) {
        self.set_consumer(None);
        let next = if inner.dispose_requested {
            ServiceState::Disposed
        } else {
            ServiceState::NotStarted
        };
        self.set_state(inner, next);
    }

    /// Remove hooks, close the queue and signal cancellation, in that
    /// order. Returns the worker still to be waited on.
    fn release(&self, session: Session) -> ConsumerWorker {
        let Session {
            hooks,
            queue,
            cancel,
            worker,
        } = session;

        for handle in hooks {
            let kind = handle.kind();
            if !self.backend.remove(handle) {
                log::warn!("{kind} hook was already removed");
            }
        }
        queue.close();
        cancel.cancel();
        worker
    }

    fn teardown_blocking(&self, session: Session) {
        let worker = self.release(session);
        if worker.is_current() {
            worker.detach();
        } else {
            worker.join();
        }
    }
}

/// Completes a stop whose session has already been released.
///
/// Finishing happens on drop, so an abandoned `stop_async` cannot leave the
/// service `Stopping`.
struct PendingStop<'a, B: HookBackend> {
    service: &'a InputHookService<B>,
    worker: Option<ConsumerWorker>,
}

impl<B: HookBackend> Drop for PendingStop<'_, B> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
        self.service.finish_stop(&mut self.service.lock());
    }
}

impl<B: HookBackend> Drop for InputHookService<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<B: HookBackend + fmt::Debug> fmt::Debug for InputHookService<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputHookService")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}
