use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::store::{
    DbCollection, DbStore, Store,
    data::*,
    db::postgres::{
        DbInit,
        collection::{
            ContactCollection, DeliveryCollection, FlowCollection, OrderCollection, RunCollection, RunStepCollection, TemplateCollection,
            TriggerCollection, WorkspaceCollection,
        },
        synclient::SynClient,
    },
};

/// PostgreSQL backend. Creates the schema on construction and hands
/// out one collection handle per table.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    flows: Arc<FlowCollection>,
    triggers: Arc<TriggerCollection>,
    runs: Arc<RunCollection>,
    run_steps: Arc<RunStepCollection>,
    contacts: Arc<ContactCollection>,
    orders: Arc<OrderCollection>,
    deliveries: Arc<DeliveryCollection>,
    templates: Arc<TemplateCollection>,
    workspaces: Arc<WorkspaceCollection>,
}

impl DbStore for PostgresStore {
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

impl PostgresStore {
    pub fn new(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Self {
        let conn = SynClient::connect(db_url, runtime);

        let store = Self {
            flows: Arc::new(FlowCollection::new(&conn)),
            triggers: Arc::new(TriggerCollection::new(&conn)),
            runs: Arc::new(RunCollection::new(&conn)),
            run_steps: Arc::new(RunStepCollection::new(&conn)),
            contacts: Arc::new(ContactCollection::new(&conn)),
            orders: Arc::new(OrderCollection::new(&conn)),
            deliveries: Arc::new(DeliveryCollection::new(&conn)),
            templates: Arc::new(TemplateCollection::new(&conn)),
            workspaces: Arc::new(WorkspaceCollection::new(&conn)),
        };
        store.create_tables();
        store
    }

    fn create_tables(&self) {
        self.flows.init();
        self.triggers.init();
        self.runs.init();
        self.run_steps.init();
        self.contacts.init();
        self.orders.init();
        self.deliveries.init();
        self.templates.init();
        self.workspaces.init();
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
