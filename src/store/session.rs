//! Scoped storage sessions.
//!
//! A wait node may suspend a run for days or weeks, so storage access
//! is modeled as an explicitly scoped resource: the interpreter
//! acquires a session per worker invocation, hands ownership through
//! the executor, and the executor consumes it (releasing the
//! underlying resources) before calling into the durable scheduler.
//! Ownership transfer makes holding a session across a suspend
//! boundary a compile error rather than a convention.

use std::sync::Arc;

use tracing::trace;

use super::{DbCollection, Store, data::*};

pub struct StoreSession {
    store: Arc<Store>,
}

impl StoreSession {
    pub(crate) fn new(store: Arc<Store>) -> Self {
        trace!("store session acquired");
        Self {
            store,
        }
    }

    /// Explicitly release the session. Dropping has the same effect;
    /// the named form marks mandatory release points in the executor.
    pub fn release(self) {}

    pub fn flows(&self) -> Arc<dyn DbCollection<Item = Flow>> {
        self.store.flows()
    }

    pub fn triggers(&self) -> Arc<dyn DbCollection<Item = Trigger>> {
        self.store.triggers()
    }

    pub fn runs(&self) -> Arc<dyn DbCollection<Item = Run>> {
        self.store.runs()
    }

    pub fn run_steps(&self) -> Arc<dyn DbCollection<Item = RunStep>> {
        self.store.run_steps()
    }

    pub fn contacts(&self) -> Arc<dyn DbCollection<Item = Contact>> {
        self.store.contacts()
    }

    pub fn orders(&self) -> Arc<dyn DbCollection<Item = Order>> {
        self.store.orders()
    }

    pub fn deliveries(&self) -> Arc<dyn DbCollection<Item = Delivery>> {
        self.store.deliveries()
    }

    pub fn templates(&self) -> Arc<dyn DbCollection<Item = Template>> {
        self.store.templates()
    }

    pub fn workspaces(&self) -> Arc<dyn DbCollection<Item = Workspace>> {
        self.store.workspaces()
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        trace!("store session released");
    }
}
