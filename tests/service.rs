//! End-to-end tests of the hook service driven through `MockBackend`.

use globalhook::translate::message::*;
use globalhook::{
    Error, ExecutionContext, Handlers, HookConfig, HookKind, InputHandler, InputHookService, Job,
    KeyCode, MockBackend, ServiceState,
};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Down(KeyCode),
    Up(KeyCode),
    Error(Error),
}

/// Records every callback along with the thread it ran on.
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(Call, ThreadId)>>>,
    panic_on_down: Option<KeyCode>,
    delay: Option<Duration>,
}

impl Recorder {
    fn panicking_on(code: KeyCode) -> Self {
        Self {
            panic_on_down: Some(code),
            ..Self::default()
        }
    }

    /// A recorder that sleeps in every key callback.
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn push(&self, call: Call) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.calls
            .lock()
            .unwrap()
            .push((call, thread::current().id()));
    }

    fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    fn threads(&self) -> Vec<ThreadId> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id)| *id)
            .collect()
    }
}

impl InputHandler for Recorder {
    fn on_key_down(&self, code: KeyCode) {
        if self.panic_on_down == Some(code) {
            panic!("refusing {code}");
        }
        self.push(Call::Down(code));
    }

    fn on_key_up(&self, code: KeyCode) {
        self.push(Call::Up(code));
    }

    fn on_error(&self, error: Error) {
        self.push(Call::Error(error));
    }
}

fn service_with(backend: &MockBackend, recorder: &Recorder) -> InputHookService<MockBackend> {
    InputHookService::with_backend(backend.clone(), recorder.clone())
}

#[tokio::test]
async fn test_stop_async_delivers_buffered_events() {
    let backend = MockBackend::new();
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    assert!(backend.inject_keyboard(WM_KEYDOWN, 0x41));
    assert!(backend.inject_keyboard(WM_KEYUP, 0x41));
    service.stop_async().await.unwrap();

    assert_eq!(
        recorder.calls(),
        vec![Call::Down(KeyCode::KeyA), Call::Up(KeyCode::KeyA)]
    );
    assert_eq!(service.state(), ServiceState::NotStarted);
    assert!(backend.installed().is_empty());
}

#[tokio::test]
async fn test_stop_async_drains_behind_slow_handler() {
    let backend = MockBackend::new();
    let recorder = Recorder::slow(Duration::from_millis(100));
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    backend.inject_keyboard(WM_KEYUP, 0x41);
    // The first callback is still sleeping, so the release is still queued.
    service.stop_async().await.unwrap();

    assert_eq!(
        recorder.calls(),
        vec![Call::Down(KeyCode::KeyA), Call::Up(KeyCode::KeyA)]
    );
    assert_eq!(service.state(), ServiceState::NotStarted);
}

#[tokio::test]
async fn test_abandoned_stop_async_still_finishes() {
    let backend = MockBackend::new();
    let recorder = Recorder::slow(Duration::from_millis(300));
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    let result = tokio::time::timeout(Duration::from_millis(10), service.stop_async()).await;
    assert!(result.is_err(), "stop should still be waiting on the handler");

    assert_eq!(service.state(), ServiceState::NotStarted);
    assert_eq!(recorder.calls(), vec![Call::Down(KeyCode::KeyA)]);
    assert!(backend.installed().is_empty());

    service.start(None).unwrap();
    service.stop().unwrap();
    service.dispose();
    assert_eq!(service.state(), ServiceState::Disposed);
}

#[test]
fn test_drop_after_abandoned_stop_async() {
    let backend = MockBackend::new();
    let recorder = Recorder::slow(Duration::from_millis(200));
    let service = service_with(&backend, &recorder);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x42);
    runtime.block_on(async {
        tokio::select! {
            _ = service.stop_async() => panic!("stop finished before the handler"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
    });

    drop(service);
    assert_eq!(backend.remove_count(), 2);
    assert_eq!(recorder.calls(), vec![Call::Down(KeyCode::KeyB)]);
}

#[test]
fn test_inline_delivery_runs_on_consumer_thread() {
    let backend = MockBackend::new();
    let names = Arc::new(Mutex::new(Vec::new()));
    let seen = names.clone();
    let handlers = Handlers::new().on_key_down(move |_| {
        let name = thread::current().name().map(str::to_string);
        seen.lock().unwrap().push(name);
    });
    let service = InputHookService::with_backend(backend.clone(), handlers)
        .with_config(HookConfig::new().thread_name("hook-test-consumer"));

    service.start(None).unwrap();
    backend.inject_mouse(WM_LBUTTONDOWN, 0);
    service.stop().unwrap();

    assert_eq!(
        *names.lock().unwrap(),
        vec![Some("hook-test-consumer".to_string())]
    );
}

#[test]
fn test_left_button_press_and_release() {
    let backend = MockBackend::new();
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    backend.inject_mouse(WM_LBUTTONDOWN, 0);
    backend.inject_mouse(WM_MOUSEMOVE, 0);
    backend.inject_mouse(WM_LBUTTONUP, 0);
    service.stop().unwrap();

    assert_eq!(
        recorder.calls(),
        vec![Call::Down(KeyCode::LeftMouse), Call::Up(KeyCode::LeftMouse)]
    );
    let threads = recorder.threads();
    assert_eq!(threads[0], threads[1]);
    assert_ne!(threads[0], thread::current().id());
}

#[test]
fn test_events_keep_fifo_order_with_wheel_releases() {
    let backend = MockBackend::new();
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    backend.inject_keyboard(WM_SYSKEYDOWN, 0x12);
    backend.inject_mouse(WM_MOUSEWHEEL, 120 << 16);
    backend.inject_mouse(WM_XBUTTONDOWN, 0x0002_0000);
    backend.inject_mouse(WM_XBUTTONDOWN, 0x0004_0000);
    backend.inject_mouse(WM_MOUSEWHEEL, 0xFF88_0000);
    backend.inject_mouse(WM_MOUSEWHEEL, 0);
    backend.inject_keyboard(WM_SYSKEYUP, 0x12);
    service.stop().unwrap();

    assert_eq!(
        recorder.calls(),
        vec![
            Call::Down(KeyCode::Alt),
            Call::Down(KeyCode::ScrollUp),
            Call::Up(KeyCode::ScrollUp),
            Call::Down(KeyCode::Mouse5),
            Call::Down(KeyCode::ScrollDown),
            Call::Up(KeyCode::ScrollDown),
            Call::Up(KeyCode::Alt),
        ]
    );
}

#[test]
fn test_handler_panic_is_reported_and_loop_continues() {
    let backend = MockBackend::new();
    let recorder = Recorder::panicking_on(KeyCode::KeyA);
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    backend.inject_keyboard(WM_KEYDOWN, 0x42);
    service.stop().unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        &calls[0],
        Call::Error(Error::HandlerPanicked { callback: "on_key_down", message })
            if message == "refusing KeyA"
    ));
    assert_eq!(calls[1], Call::Down(KeyCode::KeyB));
}

#[test]
fn test_hook_fault_reaches_on_error() {
    let backend = MockBackend::new();
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    assert!(backend.inject_fault(Error::MalformedPayload("null lparam".into())));
    service.stop().unwrap();

    assert_eq!(
        recorder.calls(),
        vec![Call::Error(Error::MalformedPayload("null lparam".into()))]
    );
}

#[test]
fn test_second_start_is_a_noop() {
    let backend = MockBackend::new();
    let service = service_with(&backend, &Recorder::default());

    service.start(None).unwrap();
    service.start(None).unwrap();
    assert_eq!(backend.install_count(), 2);
    assert_eq!(backend.installed(), vec![HookKind::Keyboard, HookKind::Mouse]);

    service.stop().unwrap();
    assert_eq!(backend.remove_count(), 2);
}

#[test]
fn test_stop_when_idle_is_a_noop() {
    let backend = MockBackend::new();
    let service = service_with(&backend, &Recorder::default());

    service.stop().unwrap();
    service.stop().unwrap();
    assert_eq!(service.state(), ServiceState::NotStarted);
    assert_eq!(backend.remove_count(), 0);
}

#[tokio::test]
async fn test_operations_after_dispose() {
    let backend = MockBackend::new();
    let service = service_with(&backend, &Recorder::default());

    service.start(None).unwrap();
    service.dispose();
    assert_eq!(service.state(), ServiceState::Disposed);
    assert!(backend.installed().is_empty());

    assert_eq!(service.start(None), Err(Error::Disposed));
    assert_eq!(service.stop(), Err(Error::Disposed));
    assert_eq!(service.stop_async().await, Err(Error::Disposed));
    service.dispose();
    assert_eq!(service.state(), ServiceState::Disposed);
}

#[test]
fn test_failed_mouse_hook_rolls_back_keyboard_hook() {
    let backend = MockBackend::new().fail_install(HookKind::Mouse);
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);

    let result = service.start(None);
    assert!(matches!(
        result,
        Err(Error::HookInstall {
            kind: HookKind::Mouse,
            ..
        })
    ));
    assert_eq!(service.state(), ServiceState::NotStarted);
    assert!(backend.installed().is_empty());
    assert_eq!(backend.install_count(), 1);
    assert_eq!(backend.remove_count(), 1);
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_restart_after_stop() {
    let backend = MockBackend::new();
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x31);
    service.stop().unwrap();
    assert!(!backend.inject_keyboard(WM_KEYDOWN, 0x32));

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x33);
    service.stop().unwrap();

    assert_eq!(
        recorder.calls(),
        vec![Call::Down(KeyCode::Num1), Call::Down(KeyCode::Num3)]
    );
    assert_eq!(backend.install_count(), 4);
}

#[test]
fn test_unsupported_platform() {
    let backend = MockBackend::unsupported();
    let service = service_with(&backend, &Recorder::default());

    assert!(matches!(
        service.start(None),
        Err(Error::PlatformUnsupported(_))
    ));
    assert_eq!(service.state(), ServiceState::NotStarted);
    assert_eq!(backend.install_count(), 0);
}

#[cfg(not(target_os = "windows"))]
#[test]
fn test_native_backend_is_unsupported_off_windows() {
    let service = InputHookService::new(Recorder::default());
    assert!(matches!(
        service.start(None),
        Err(Error::PlatformUnsupported(_))
    ));
}

#[test]
fn test_context_runs_every_callback() {
    let backend = MockBackend::new();
    let recorder = Recorder::panicking_on(KeyCode::KeyB);
    let service = service_with(&backend, &recorder);
    let (tx, rx) = mpsc::channel::<Job>();

    service.start(Some(ExecutionContext::new(tx))).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    backend.inject_mouse(WM_MOUSEWHEEL, 120 << 16);
    backend.inject_keyboard(WM_KEYDOWN, 0x42);
    service.stop().unwrap();

    // Nothing runs until the context does.
    assert!(recorder.calls().is_empty());

    while let Ok(job) = rx.try_recv() {
        job();
    }

    let calls = recorder.calls();
    assert_eq!(
        &calls[..3],
        &[
            Call::Down(KeyCode::KeyA),
            Call::Down(KeyCode::ScrollUp),
            Call::Up(KeyCode::ScrollUp),
        ]
    );
    assert!(matches!(calls[3], Call::Error(Error::HandlerPanicked { .. })));
    assert!(
        recorder
            .threads()
            .iter()
            .all(|id| *id == thread::current().id())
    );
}

#[tokio::test]
async fn test_tokio_channel_context() {
    let backend = MockBackend::new();
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Job>();

    service.start(Some(ExecutionContext::new(tx))).unwrap();
    backend.inject_mouse(WM_RBUTTONDOWN, 0);
    backend.inject_mouse(WM_RBUTTONUP, 0);
    service.stop_async().await.unwrap();

    while let Ok(job) = rx.try_recv() {
        job();
    }
    assert_eq!(
        recorder.calls(),
        vec![Call::Down(KeyCode::RightMouse), Call::Up(KeyCode::RightMouse)]
    );
}

#[test]
fn test_closed_context_reports_dispatch_error() {
    let backend = MockBackend::new();
    let recorder = Recorder::default();
    let service = service_with(&backend, &recorder);
    let (tx, rx) = mpsc::channel::<Job>();
    drop(rx);

    service.start(Some(ExecutionContext::new(tx))).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    service.stop().unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Call::Error(Error::Dispatch(_))));
}

type MockService = InputHookService<MockBackend>;

/// Build a service whose key-down handler runs `f` against the service.
fn self_referencing<R, F>(backend: &MockBackend, f: F) -> (Arc<MockService>, mpsc::Receiver<R>)
where
    R: Send + 'static,
    F: Fn(&MockService) -> R + Send + Sync + 'static,
{
    let slot: Arc<OnceLock<Weak<MockService>>> = Arc::default();
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);

    let handler_slot = slot.clone();
    let handlers = Handlers::new().on_key_down(move |_| {
        if let Some(service) = handler_slot.get().and_then(Weak::upgrade) {
            let _ = tx.lock().unwrap().send(f(&service));
        }
    });

    let service = Arc::new(InputHookService::with_backend(backend.clone(), handlers));
    slot.set(Arc::downgrade(&service)).unwrap();
    (service, rx)
}

#[test]
fn test_stop_from_handler_is_rejected() {
    let backend = MockBackend::new();
    let (service, rx) = self_referencing(&backend, |service| service.stop());

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(result, Err(Error::Reentrant("stop")));

    assert!(service.is_running());
    service.stop().unwrap();
}

#[test]
fn test_dispose_from_handler_does_not_deadlock() {
    let backend = MockBackend::new();
    let (service, rx) = self_referencing(&backend, |service| {
        service.dispose();
        service.state()
    });

    service.start(None).unwrap();
    backend.inject_keyboard(WM_KEYDOWN, 0x41);
    let state = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(state, ServiceState::Disposed);

    assert!(backend.installed().is_empty());
    assert_eq!(service.stop(), Err(Error::Disposed));
}

#[test]
fn test_concurrent_stops() {
    let backend = MockBackend::new();
    let service = Arc::new(service_with(&backend, &Recorder::default()));
    service.start(None).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || service.stop())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    assert_eq!(service.state(), ServiceState::NotStarted);
    assert_eq!(backend.remove_count(), 2);
}

#[tokio::test]
async fn test_watch_state_follows_lifecycle() {
    let backend = MockBackend::new();
    let service = service_with(&backend, &Recorder::default());
    let mut states = service.watch_state();

    service.start(None).unwrap();
    states
        .wait_for(|state| *state == ServiceState::Running)
        .await
        .unwrap();

    service.stop_async().await.unwrap();
    assert_eq!(*states.borrow_and_update(), ServiceState::NotStarted);
}
