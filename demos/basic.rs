//! Basic example printing every key and button press.
//!
//! Run with: cargo run --example basic
//!
//! Note: global hooks are only available on Windows.

use globalhook::{Handlers, InputHookService};

#[cfg(target_os = "windows")]
fn main() {
    use globalhook::platform::windows::MessageLoop;

    println!("globalhook basic example");
    println!("Press Ctrl+C to exit\n");

    let service = InputHookService::new(
        Handlers::new()
            .on_key_down(|code| println!("Down: {code} (code: 0x{:02X})", code.code()))
            .on_key_up(|code| println!("Up:   {code}"))
            .on_error(|e| eprintln!("Hook error: {e}")),
    );

    // Hooks fire on the thread that installed them, so start here and pump
    // messages on this same thread.
    let message_loop = MessageLoop::current();
    let quit = message_loop.handle();
    ctrlc::set_handler(move || {
        quit.quit();
    })
    .expect("Failed to set Ctrl+C handler");

    if let Err(e) = service.start(None) {
        eprintln!("Error: {e}");
        return;
    }

    message_loop.run();

    if let Err(e) = service.stop() {
        eprintln!("Error: {e}");
    }
    println!("Stopped.");
}

#[cfg(not(target_os = "windows"))]
fn main() {
    let service = InputHookService::new(Handlers::new());
    match service.start(None) {
        Err(e) => eprintln!("Error: {e}"),
        Ok(()) => println!("Hooks started."),
    }
}
