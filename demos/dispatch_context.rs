//! Run callbacks on your own thread through an execution context.
//!
//! Run with: cargo run --example dispatch_context
//!
//! The service hands each callback to a channel, and the main thread runs
//! them, the way a UI dispatcher would. Input comes from `MockBackend` so the
//! example works on any platform.

use globalhook::translate::message::{WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_MOUSEWHEEL};
use globalhook::{ExecutionContext, Handlers, InputHookService, Job, MockBackend};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn main() {
    println!("globalhook execution context example");
    println!("====================================\n");

    let backend = MockBackend::new();
    let service = InputHookService::with_backend(
        backend.clone(),
        Handlers::new()
            .on_key_down(|code| println!("[{:?}] down {code}", thread::current().name()))
            .on_key_up(|code| println!("[{:?}] up   {code}", thread::current().name())),
    );

    let (tx, rx) = mpsc::channel::<Job>();
    service
        .start(Some(ExecutionContext::new(tx)))
        .expect("Failed to start service");

    // Pretend to be the OS.
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    backend.inject_keyboard(WM_KEYUP, 0x41);
    backend.inject_mouse(WM_LBUTTONDOWN, 0);
    backend.inject_mouse(WM_MOUSEWHEEL, 120 << 16);

    let mut jobs = 0;
    while let Ok(job) = rx.recv_timeout(Duration::from_millis(200)) {
        job();
        jobs += 1;
    }

    service.stop().expect("Failed to stop service");
    println!("\nRan {jobs} jobs on the main thread.");
}
