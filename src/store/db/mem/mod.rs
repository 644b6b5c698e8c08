mod collect;
mod docs;

use std::{collections::HashMap, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::{
    Result,
    store::{DbCollection, DbStore, Store, data::*},
};
pub use collect::Collect;

/// In-memory backend for tests and embedded development.
#[derive(Debug, Clone)]
pub struct MemStore {
    flows: Arc<Collect<Flow>>,
    triggers: Arc<Collect<Trigger>>,
    runs: Arc<Collect<Run>>,
    run_steps: Arc<Collect<RunStep>>,
    contacts: Arc<Collect<Contact>>,
    orders: Arc<Collect<Order>>,
    deliveries: Arc<Collect<Delivery>>,
    templates: Arc<Collect<Template>>,
    workspaces: Arc<Collect<Workspace>>,
}

/// Row types that can live in a [`Collect`]. The default `doc` form
/// is the row's JSON object, used for filter matching and ordering.
trait DbDocument: Serialize + DeserializeOwned {
    fn id(&self) -> &str;

    fn doc(&self) -> Result<HashMap<String, JsonValue>> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map.into_iter().collect()),
            _ => Ok(HashMap::new()),
        }
    }
}

impl DbStore for MemStore {
    fn init(
        &self,
        s: &Store,
    ) {
        s.register(self.flows());
        s.register(self.triggers());
        s.register(self.runs());
        s.register(self.run_steps());
        s.register(self.contacts());
        s.register(self.orders());
        s.register(self.deliveries());
        s.register(self.templates());
        s.register(self.workspaces());
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            flows: Arc::new(Collect::new("flows")),
            triggers: Arc::new(Collect::new("triggers")),
            runs: Arc::new(Collect::new("runs")),
            run_steps: Arc::new(Collect::new("run_steps")),
            contacts: Arc::new(Collect::new("contacts")),
            orders: Arc::new(Collect::new("orders")),
            deliveries: Arc::new(Collect::new("deliveries")),
            templates: Arc::new(Collect::new("templates")),
            workspaces: Arc::new(Collect::new("workspaces")),
        }
    }

    pub fn flows(&self) -> Arc<dyn DbCollection<Item = Flow> + Send + Sync> {
        self.flows.clone()
    }

    pub fn triggers(&self) -> Arc<dyn DbCollection<Item = Trigger> + Send + Sync> {
        self.triggers.clone()
    }

    pub fn runs(&self) -> Arc<dyn DbCollection<Item = Run> + Send + Sync> {
        self.runs.clone()
    }

    pub fn run_steps(&self) -> Arc<dyn DbCollection<Item = RunStep> + Send + Sync> {
        self.run_steps.clone()
    }

    pub fn contacts(&self) -> Arc<dyn DbCollection<Item = Contact> + Send + Sync> {
        self.contacts.clone()
    }

    pub fn orders(&self) -> Arc<dyn DbCollection<Item = Order> + Send + Sync> {
        self.orders.clone()
    }

    pub fn deliveries(&self) -> Arc<dyn DbCollection<Item = Delivery> + Send + Sync> {
        self.deliveries.clone()
    }

    pub fn templates(&self) -> Arc<dyn DbCollection<Item = Template> + Send + Sync> {
        self.templates.clone()
    }

    pub fn workspaces(&self) -> Arc<dyn DbCollection<Item = Workspace> + Send + Sync> {
        self.workspaces.clone()
    }
}
