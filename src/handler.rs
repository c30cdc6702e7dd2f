//! Extension points invoked by the consumer loop.

use crate::error::Error;
use crate::keycode::KeyCode;
use std::sync::Arc;

/// Receives normalized input from the hook service.
///
/// Callbacks run on the consumer thread, or on the
/// [`ExecutionContext`](crate::ExecutionContext) passed to `start`. They may
/// be slow: the hook procedure never waits for them. A panic inside
/// `on_key_down` or `on_key_up` is caught and reported to `on_error`.
pub trait InputHandler: Send + Sync + 'static {
    /// A key or button was pressed. Repeats for held keys.
    fn on_key_down(&self, code: KeyCode);

    /// A key or button was released.
    ///
    /// For [`KeyCode::ScrollUp`] and [`KeyCode::ScrollDown`] this is a
    /// synthesized release that always directly follows the press.
    fn on_key_up(&self, code: KeyCode);

    /// Processing of a single event failed. The service keeps running.
    fn on_error(&self, error: Error) {
        log::error!("unhandled hook error: {error}");
    }
}

impl<T: InputHandler + ?Sized> InputHandler for Arc<T> {
    fn on_key_down(&self, code: KeyCode) {
        (**self).on_key_down(code)
    }

    fn on_key_up(&self, code: KeyCode) {
        (**self).on_key_up(code)
    }

    fn on_error(&self, error: Error) {
        (**self).on_error(error)
    }
}

type CodeCallback = Box<dyn Fn(KeyCode) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(Error) + Send + Sync>;

/// An [`InputHandler`] assembled from closures.
///
/// Unset callbacks do nothing, except `on_error` which logs.
///
/// ```
/// use globalhook::Handlers;
///
/// let handlers = Handlers::new()
///     .on_key_down(|code| println!("{code} down"))
///     .on_key_up(|code| println!("{code} up"))
///     .on_error(|err| eprintln!("hook error: {err}"));
/// ```
#[derive(Default)]
pub struct Handlers {
    key_down: Option<CodeCallback>,
    key_up: Option<CodeCallback>,
    error: Option<ErrorCallback>,
}

impl Handlers {
    /// Create an empty handler set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key-down callback.
    pub fn on_key_down<F>(mut self, f: F) -> Self
    where
        F: Fn(KeyCode) + Send + Sync + 'static,
    {
        self.key_down = Some(Box::new(f));
        self
    }

    /// Set the key-up callback.
    pub fn on_key_up<F>(mut self, f: F) -> Self
    where
        F: Fn(KeyCode) + Send + Sync + 'static,
    {
        self.key_up = Some(Box::new(f));
        self
    }

    /// Set the error callback.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }
}

impl InputHandler for Handlers {
    fn on_key_down(&self, code: KeyCode) {
        if let Some(f) = &self.key_down {
            f(code);
        }
    }

    fn on_key_up(&self, code: KeyCode) {
        if let Some(f) = &self.key_up {
            f(code);
        }
    }

    fn on_error(&self, error: Error) {
        match &self.error {
            Some(f) => f(error),
            None => log::error!("unhandled hook error: {error}"),
        }
    }
}
