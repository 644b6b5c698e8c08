use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::{
    Config, Engine, Result, StoreType,
    common::{BroadcastQueue, Queue},
    dispatcher::TriggerDispatcher,
    events::RunEvent,
    executor::ActionExecutor,
    interpreter::Interpreter,
    providers::{AudienceSync, EmailDelivery, HttpAudienceClient, HttpEmailProvider},
    scheduler::{DurableScheduler, TokioScheduler},
    store::{DbStore, MemStore, PostgresStore, Store},
};

/// Size of the inbound trigger invocation queue.
const INVOCATION_QUEUE_SIZE: usize = 1024;
/// Capacity of the run event broadcast channel.
const EVENT_QUEUE_SIZE: usize = 256;

/// Assembles an [`Engine`] from a config plus optional overrides.
///
/// Tests and embedders replace the providers and scheduler with their
/// own implementations; production builds take the HTTP providers and
/// the tokio timer by default.
pub struct EngineBuilder {
    config: Config,
    rt: Option<Arc<Runtime>>,
    email: Option<Arc<dyn EmailDelivery>>,
    audience: Option<Arc<dyn AudienceSync>>,
    scheduler: Option<Arc<dyn DurableScheduler>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            rt: None,
            email: None,
            audience: None,
            scheduler: None,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    pub fn email_provider(
        mut self,
        email: Arc<dyn EmailDelivery>,
    ) -> Self {
        self.email = Some(email);
        self
    }

    pub fn audience_client(
        mut self,
        audience: Arc<dyn AudienceSync>,
    ) -> Self {
        self.audience = Some(audience);
        self
    }

    pub fn scheduler(
        mut self,
        scheduler: Arc<dyn DurableScheduler>,
    ) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(&self) -> Result<Engine> {
        let runtime = match self.rt.as_ref() {
            Some(rt) => rt.clone(),
            None => Arc::new(
                Builder::new_multi_thread().worker_threads(self.config.async_worker_thread_number.into()).enable_all().build().unwrap(),
            ),
        };

        let store = Store::new();
        let db: Box<dyn DbStore> = match self.config.store.store_type {
            StoreType::Mem => Box::new(MemStore::new()),
            StoreType::Postgres => Box::new(PostgresStore::new(
                &self.config.store.postgres.as_ref().expect("Postgres configuration is required when store type is Postgres").database_url,
                runtime.clone(),
            )),
        };
        db.init(&store);
        let store = Arc::new(store);

        let events = BroadcastQueue::new(EVENT_QUEUE_SIZE);
        let email: Arc<dyn EmailDelivery> = match self.email.as_ref() {
            Some(email) => email.clone(),
            None => Arc::new(HttpEmailProvider::new(self.config.email.endpoint.clone(), self.config.email.api_key.clone())),
        };
        let audience: Arc<dyn AudienceSync> = match self.audience.as_ref() {
            Some(audience) => audience.clone(),
            None => Arc::new(HttpAudienceClient::new()),
        };
        let scheduler: Arc<dyn DurableScheduler> = match self.scheduler.as_ref() {
            Some(scheduler) => scheduler.clone(),
            None => Arc::new(TokioScheduler::new()),
        };

        let executor = Arc::new(ActionExecutor::new(store.clone(), email, audience, scheduler, events.clone()));
        let interpreter = Arc::new(Interpreter::new(store.clone(), executor, events.clone()));
        let dispatcher = Arc::new(TriggerDispatcher::new(store.clone(), interpreter));
        let queue = Queue::new(INVOCATION_QUEUE_SIZE);

        let engine = Engine::new(runtime, store, dispatcher, queue, events, self.config.async_worker_thread_number);

        Ok(engine)
    }
}
