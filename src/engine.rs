//! Engine lifecycle and trigger intake.
//!
//! The engine owns the worker pool that drains the invocation queue.
//! Domain code fires triggers with [`Engine::dispatch`] and never
//! waits for the resulting run; observers subscribe to the run event
//! stream instead.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{runtime::Runtime, sync::broadcast};
use tracing::{debug, error};

use crate::{
    DripflowError, Result,
    common::{BroadcastQueue, MemCache, Queue, Shutdown},
    dispatcher::TriggerDispatcher,
    events::RunEvent,
    model::{FlowModel, TriggerInvocation},
    store::Store,
};

/// Recently seen invocations, for in-process duplicate suppression.
const INVOCATION_CACHE_SIZE: usize = 2048;
/// How long a seen invocation suppresses duplicates. Re-fires after
/// this window go through the dispatcher's idempotency gate instead.
const INVOCATION_DEDUP_TTL: Duration = Duration::from_secs(30);

pub struct Engine {
    /// Persistent storage behind all runs.
    store: Arc<Store>,
    /// Maps invocations to runs.
    dispatcher: Arc<TriggerDispatcher>,
    /// Inbound trigger firings awaiting a worker.
    queue: Arc<Queue<TriggerInvocation>>,
    /// Run lifecycle fan-out.
    events: Arc<BroadcastQueue<RunEvent>>,
    /// Duplicate-firing suppression within this process.
    seen: Arc<MemCache<String, i64>>,

    /// Flag indicating if the engine is running.
    running: Arc<AtomicBool>,
    /// Tokio runtime for async task execution.
    runtime: Arc<Runtime>,
    /// Number of queue worker tasks to spawn.
    worker_count: u16,
    /// Shutdown coordinator for graceful termination.
    shutdown: Arc<Shutdown>,
}

impl Engine {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        store: Arc<Store>,
        dispatcher: Arc<TriggerDispatcher>,
        queue: Arc<Queue<TriggerInvocation>>,
        events: Arc<BroadcastQueue<RunEvent>>,
        worker_count: u16,
    ) -> Self {
        Self {
            store,
            dispatcher,
            queue,
            events,
            seen: Arc::new(MemCache::new(INVOCATION_CACHE_SIZE, INVOCATION_DEDUP_TTL)),
            running: Arc::new(AtomicBool::new(false)),
            runtime,
            worker_count,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Starts the worker pool that drains the invocation queue.
    pub fn launch(&self) {
        if self.running.swap(true, Ordering::Relaxed) {
            return;
        }

        for worker in 0..self.worker_count.max(1) {
            let queue = self.queue.clone();
            let dispatcher = self.dispatcher.clone();
            let shutdown = self.shutdown.clone();
            self.runtime.spawn(async move {
                debug!("dispatch worker {} started", worker);
                loop {
                    tokio::select! {
                        _ = shutdown.wait() => break,
                        Some(invocation) = queue.next_async() => {
                            let trigger_id = invocation.trigger_id.clone();
                            if let Err(err) = dispatcher.dispatch(invocation).await {
                                error!("trigger {} dispatch failed: {}", trigger_id, err);
                            }
                        }
                    }
                }
                debug!("dispatch worker {} stopped", worker);
            });
        }
    }

    /// Gracefully shuts down the engine. In-flight runs finish their
    /// current node; queued invocations are dropped.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }
        self.shutdown.shutdown();
    }

    /// Fire a trigger. Returns as soon as the invocation is queued;
    /// the run executes on a worker task.
    pub fn dispatch(
        &self,
        invocation: TriggerInvocation,
    ) -> Result<()> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(DripflowError::Engine("Engine is not running".to_string()));
        }

        let key = format!(
            "{}:{}:{}",
            invocation.trigger_id,
            invocation.contact_id.as_deref().unwrap_or_default(),
            invocation.order_id.as_deref().unwrap_or_default()
        );
        if self.seen.get(&key).is_some() {
            debug!("duplicate invocation {} suppressed", key);
            return Ok(());
        }
        self.seen.set(key, crate::utils::time::time_millis());

        self.queue.send(invocation)
    }

    /// Subscribe to the run event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Deploys a flow definition to the store.
    pub fn deploy(
        &self,
        flow: &FlowModel,
    ) -> Result<bool> {
        self.store.deploy(flow)
    }

    /// Storage handle for embedders that seed contacts, templates and
    /// workspaces directly.
    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }
}
