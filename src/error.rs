//! Error types for the hook service.

use crate::backend::HookKind;
use thiserror::Error;

/// Result type alias for globalhook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the hook service.
///
/// Lifecycle errors (`PlatformUnsupported`, `Disposed`, `HookInstall`,
/// `Reentrant`, `Thread`, `InvalidConfig`) are returned from the operation
/// that caused them. Processing errors (`MalformedPayload`,
/// `HandlerPanicked`, `Dispatch`) are never returned; they are delivered to
/// [`InputHandler::on_error`](crate::InputHandler::on_error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The current platform cannot host the global hooks.
    #[error("platform not supported: {0}")]
    PlatformUnsupported(String),

    /// The service has been disposed.
    #[error("hook service has been disposed")]
    Disposed,

    /// The platform refused to install a hook.
    #[error("failed to install {kind} hook: {reason}")]
    HookInstall { kind: HookKind, reason: String },

    /// A lifecycle operation was called from the consumer thread.
    #[error("{0} called from a handler on the consumer thread")]
    Reentrant(&'static str),

    /// The consumer thread or its runtime could not be created.
    #[error("thread error: {0}")]
    Thread(String),

    /// The service configuration cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The hook procedure received a payload it could not read.
    #[error("malformed hook payload: {0}")]
    MalformedPayload(String),

    /// A handler callback panicked.
    #[error("{callback} panicked: {message}")]
    HandlerPanicked {
        callback: &'static str,
        message: String,
    },

    /// The execution context refused a callback.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl Error {
    /// Whether this error was produced while processing a single event.
    ///
    /// Such errors never stop the service.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::MalformedPayload(_) | Error::HandlerPanicked { .. } | Error::Dispatch(_)
        )
    }
}
