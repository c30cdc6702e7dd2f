//! Execution contexts and handler invocation.
//!
//! An [`ExecutionContext`] is any target that can run a callback later,
//! usually on a specific thread (a UI loop, an async task). When the service
//! is started with one, every handler call is handed to it as a [`Job`] and
//! the consumer loop moves on without waiting for the result.

use crate::error::Error;
use crate::event::{KeyPressEvent, KeyPressKind};
use crate::handler::InputHandler;
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use thiserror::Error;

/// A unit of handler work scheduled on an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context refused a job.
#[derive(Debug, Clone, Error)]
#[error("execution context rejected job: {0}")]
pub struct DispatchError(pub String);

/// Something that can run jobs later.
///
/// Implementations must run jobs in the order they were dispatched.
pub trait Dispatcher: Send + Sync + 'static {
    /// Schedule `job` for execution. Must not wait for it to run.
    fn dispatch(&self, job: Job) -> Result<(), DispatchError>;
}

/// Closures can be used as infallible dispatchers.
impl<F> Dispatcher for F
where
    F: Fn(Job) + Send + Sync + 'static,
{
    fn dispatch(&self, job: Job) -> Result<(), DispatchError> {
        self(job);
        Ok(())
    }
}

/// Jobs are sent to a thread that drains the receiver and calls each one.
impl Dispatcher for std::sync::mpsc::Sender<Job> {
    fn dispatch(&self, job: Job) -> Result<(), DispatchError> {
        self.send(job)
            .map_err(|_| DispatchError("receiver has been dropped".into()))
    }
}

/// Jobs are sent to an async task that drains the receiver and calls each one.
impl Dispatcher for tokio::sync::mpsc::UnboundedSender<Job> {
    fn dispatch(&self, job: Job) -> Result<(), DispatchError> {
        self.send(job)
            .map_err(|_| DispatchError("receiver has been dropped".into()))
    }
}

/// Opaque handle to a [`Dispatcher`], passed to `start`.
#[derive(Clone)]
pub struct ExecutionContext(Arc<dyn Dispatcher>);

impl ExecutionContext {
    /// Wrap a dispatcher.
    pub fn new<D: Dispatcher>(dispatcher: D) -> Self {
        Self(Arc::new(dispatcher))
    }

    /// Schedule a job on this context.
    pub fn dispatch(&self, job: Job) -> Result<(), DispatchError> {
        self.0.dispatch(job)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext").finish_non_exhaustive()
    }
}

/// Routes events and errors to the handler, inline or through a context.
pub(crate) struct Dispatch {
    handler: Arc<dyn InputHandler>,
    context: Option<ExecutionContext>,
}

impl Dispatch {
    pub(crate) fn new(handler: Arc<dyn InputHandler>, context: Option<ExecutionContext>) -> Self {
        Self { handler, context }
    }

    /// Deliver one event. A wheel press and its synthesized release go out
    /// as a single job so nothing can be scheduled between them.
    pub(crate) fn deliver(&self, event: KeyPressEvent) {
        log::trace!("dispatching {:?} {}", event.kind, event.code);
        self.run(move |handler| invoke(handler, event));
    }

    /// Deliver a processing error to `on_error`.
    pub(crate) fn report(&self, error: Error) {
        self.run(move |handler| report_error(handler, error));
    }

    fn run<F>(&self, job: F)
    where
        F: FnOnce(&dyn InputHandler) + Send + 'static,
    {
        match &self.context {
            None => job(self.handler.as_ref()),
            Some(context) => {
                let handler = Arc::clone(&self.handler);
                if let Err(err) = context.dispatch(Box::new(move || job(handler.as_ref()))) {
                    log::warn!("{err}");
                    report_error(self.handler.as_ref(), Error::Dispatch(err.0));
                }
            }
        }
    }
}

fn invoke(handler: &dyn InputHandler, event: KeyPressEvent) {
    let code = event.code;
    match event.kind {
        KeyPressKind::Down => {
            guarded(handler, "on_key_down", || handler.on_key_down(code));
            if code.is_scroll() {
                guarded(handler, "on_key_up", || handler.on_key_up(code));
            }
        }
        KeyPressKind::Up => guarded(handler, "on_key_up", || handler.on_key_up(code)),
    }
}

/// Run a handler callback, turning a panic into an `on_error` report.
fn guarded<F: FnOnce()>(handler: &dyn InputHandler, callback: &'static str, f: F) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        let message = panic_message(payload.as_ref());
        report_error(handler, Error::HandlerPanicked { callback, message });
    }
}

fn report_error(handler: &dyn InputHandler, error: Error) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler.on_error(error))) {
        log::error!(
            "on_error panicked, error dropped: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
