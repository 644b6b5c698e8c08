//! Shutdown coordination for the engine and its background loops.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// One-shot shutdown signal shared between background tasks.
///
/// `shutdown()` is idempotent; every task blocked in `wait()` is
/// released and all later calls to `wait()` return immediately.
pub struct Shutdown {
    notify: Arc<Notify>,
    terminated: AtomicBool,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            terminated: AtomicBool::new(false),
        }
    }

    /// Signal shutdown and wake all waiters.
    pub fn shutdown(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Wait until shutdown is signalled.
    pub async fn wait(&self) {
        while !self.is_terminated() {
            let notified = self.notify.notified();
            if self.is_terminated() {
                break;
            }
            notified.await;
        }
    }

    /// True once shutdown has been signalled.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}
