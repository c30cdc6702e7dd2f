//! # globalhook
//!
//! Global keyboard and mouse hooks with a non-blocking press/release event
//! pipeline.
//!
//! ## Features
//!
//! - Keyboard keys and mouse buttons normalized to one [`KeyCode`] space
//! - Wheel motion reported as `ScrollUp`/`ScrollDown` presses, each followed
//!   by a synthesized release
//! - The OS hook procedure only translates and enqueues, so slow handlers
//!   never delay system input
//! - Handlers run on a dedicated consumer thread or on any
//!   [`ExecutionContext`] (a UI dispatcher, a channel, a runtime)
//! - Explicit lifecycle with blocking and async stop
//!
//! ## Quick Start
//!
//! ```no_run
//! use globalhook::{Handlers, InputHookService, KeyCode};
//!
//! let service = InputHookService::new(
//!     Handlers::new()
//!         .on_key_down(|code| {
//!             if code == KeyCode::Escape {
//!                 println!("escape pressed");
//!             }
//!         })
//!         .on_key_up(|code| println!("{code} released")),
//! );
//!
//! service.start(None).expect("failed to start hooks");
//! // Pump messages on this thread, e.g. with platform::windows::MessageLoop.
//! service.stop().expect("failed to stop hooks");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! hook procedure --translate--> queue --> consumer thread --> InputHandler
//!                                                     \--> ExecutionContext
//! ```
//!
//! Platform access goes through the [`HookBackend`] trait. [`MockBackend`]
//! drives the whole pipeline without OS hooks.

pub mod backend;
pub mod config;
mod consumer;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handler;
pub mod keycode;
pub mod mock;
pub mod platform;
pub mod queue;
pub mod service;
pub mod translate;

// Re-exports
pub use backend::{HookBackend, HookHandle, HookKind, RawEventSink};
pub use config::HookConfig;
pub use dispatch::{DispatchError, Dispatcher, ExecutionContext, Job};
pub use error::{Error, Result};
pub use event::{KeyPressEvent, KeyPressKind};
pub use handler::{Handlers, InputHandler};
pub use keycode::KeyCode;
pub use mock::MockBackend;
pub use platform::PlatformBackend;
pub use service::{InputHookService, ServiceState};
