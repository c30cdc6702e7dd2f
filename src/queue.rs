//! Unbounded event queue between hook procedures and the consumer loop.
//!
//! Any number of [`EventSender`]s push without blocking; one
//! [`EventReceiver`] drains. Closing the queue rejects further pushes while
//! everything already buffered is still delivered before the receiver
//! reports end-of-stream.

use crate::error::{Error, Result};
use crate::event::KeyPressEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, watch};

/// An item carried by the queue: an event, or a fault detected by a hook
/// procedure that must reach `on_error`.
pub type QueueItem = Result<KeyPressEvent>;

/// Create a connected sender/receiver pair.
pub fn unbounded() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (closed_tx, closed_rx) = watch::channel(false);

    let sender = EventSender {
        tx,
        close: Arc::new(CloseFlag {
            closed: AtomicBool::new(false),
            notify: closed_tx,
        }),
    };
    let receiver = EventReceiver {
        rx,
        closed: closed_rx,
        draining: false,
    };
    (sender, receiver)
}

/// Shared close state. The atomic is what producers check; the watch
/// channel wakes a receiver that is parked on an empty queue.
struct CloseFlag {
    closed: AtomicBool,
    notify: watch::Sender<bool>,
}

/// Producer side of the queue.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<QueueItem>,
    close: Arc<CloseFlag>,
}

impl EventSender {
    /// Enqueue an event. Never blocks; a closed queue silently drops it.
    #[inline]
    pub fn push(&self, event: KeyPressEvent) {
        self.send(Ok(event));
    }

    /// Enqueue a processing fault. Same delivery rules as [`push`](Self::push).
    pub fn push_fault(&self, error: Error) {
        self.send(Err(error));
    }

    #[inline]
    fn send(&self, item: QueueItem) {
        if self.close.closed.load(Ordering::Acquire) {
            return;
        }
        let _ = self.tx.send(item);
    }

    /// Close the queue for every sender.
    ///
    /// Calling this more than once has no further effect.
    pub fn close(&self) {
        if !self.close.closed.swap(true, Ordering::AcqRel) {
            self.close.notify.send_replace(true);
        }
    }

    /// Check if the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.close.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }
}

/// Consumer side of the queue.
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<QueueItem>,
    closed: watch::Receiver<bool>,
    draining: bool,
}

impl EventReceiver {
    /// Wait for the next item.
    ///
    /// Returns `None` once the queue is closed and every buffered item has
    /// been returned, or when all senders are gone.
    pub async fn recv(&mut self) -> Option<QueueItem> {
        if !self.draining {
            tokio::select! {
                biased;
                item = self.rx.recv() => return item,
                _ = self.closed.wait_for(|closed| *closed) => {}
            }
            // Stop accepting new items; buffered ones are still returned.
            self.rx.close();
            self.draining = true;
        }
        self.rx.recv().await
    }
}
