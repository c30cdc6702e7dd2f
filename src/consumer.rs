//! The consumer loop and the thread that drives it.
//!
//! One loop runs per service lifetime. It waits on the queue (never polls),
//! hands each item to [`Dispatch`], and exits when the queue reports
//! end-of-stream or cancellation is signalled while the queue is empty.

use crate::dispatch::Dispatch;
use crate::error::{Error, Result};
use crate::queue::EventReceiver;
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::{oneshot, watch};

/// Create a cancellation pair.
pub(crate) fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelToken(rx))
}

/// Signals cancellation to the consumer loop.
pub(crate) struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub(crate) fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Observed by the consumer loop.
pub(crate) struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    /// Resolves once cancelled, or once the handle is gone.
    pub(crate) async fn cancelled(&mut self) {
        let _ = self.0.wait_for(|cancelled| *cancelled).await;
    }
}

/// Drain `queue` into `dispatch` until end-of-stream or cancellation.
///
/// The queue branch is polled first, so items that are already buffered are
/// always delivered before cancellation is noticed.
pub(crate) async fn run(mut queue: EventReceiver, mut cancel: CancelToken, dispatch: Dispatch) {
    log::debug!("consumer loop started");

    loop {
        let item = tokio::select! {
            biased;
            item = queue.recv() => item,
            _ = cancel.cancelled() => {
                log::debug!("consumer loop cancelled");
                break;
            }
        };

        match item {
            Some(Ok(event)) => dispatch.deliver(event),
            Some(Err(error)) => dispatch.report(error),
            None => break,
        }
    }

    log::debug!("consumer loop finished");
}

/// The dedicated thread running [`run`] on a current-thread runtime.
pub(crate) struct ConsumerWorker {
    thread: JoinHandle<()>,
    done: Option<oneshot::Receiver<()>>,
}

impl ConsumerWorker {
    /// Spawn the consumer thread.
    pub(crate) fn spawn(
        name: &str,
        queue: EventReceiver,
        cancel: CancelToken,
        dispatch: Dispatch,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| Error::Thread(format!("failed to build consumer runtime: {e}")))?;
        let (done_tx, done) = oneshot::channel();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                runtime.block_on(run(queue, cancel, dispatch));
                drop(runtime);
                let _ = done_tx.send(());
            })
            .map_err(|e| Error::Thread(format!("failed to spawn consumer thread: {e}")))?;

        Ok(Self {
            thread,
            done: Some(done),
        })
    }

    pub(crate) fn thread_id(&self) -> ThreadId {
        self.thread.thread().id()
    }

    /// Check if the caller is running on this worker's thread.
    pub(crate) fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id()
    }

    /// Block until the loop has exited.
    pub(crate) fn join(self) {
        if self.thread.join().is_err() {
            log::error!("consumer thread panicked");
        }
    }

    /// Wait for the loop to exit without blocking the async caller.
    ///
    /// Cancel-safe: if the future is dropped the worker is untouched and can
    /// still be joined.
    pub(crate) async fn exited(&mut self) {
        if let Some(done) = self.done.as_mut() {
            // An error means the thread died before signalling; join reports it.
            let _ = done.await;
            self.done = None;
        }
    }

    /// Let the loop finish on its own. Used when the worker is torn down
    /// from its own thread.
    pub(crate) fn detach(self) {
        log::debug!("consumer thread detached during teardown from inside a handler");
    }
}
