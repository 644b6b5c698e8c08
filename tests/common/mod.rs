//! Shared test harness: an engine wired to the in-memory store with
//! scripted provider doubles and an instant scheduler.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use dripflow::{
    Action, ActionKind, BooleanBranch, DripflowError, EdgeKind, EdgeModel, FlowModel, Result, RunEvent,
    common::BroadcastQueue,
    dispatcher::TriggerDispatcher,
    executor::ActionExecutor,
    interpreter::Interpreter,
    providers::{AudienceCredentials, AudienceSync, ContactProfile, DeliveryReceipt, EmailDelivery, EmailMessage},
    scheduler::DurableScheduler,
    store::{DbStore, MemStore, Store, data},
    utils,
};

/// Email double that records every message and can be told to fail.
#[derive(Default)]
pub struct MockEmail {
    pub sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl MockEmail {
    pub fn fail_next_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailDelivery for MockEmail {
    async fn send(
        &self,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DripflowError::Provider {
                provider: "email".to_string(),
                message: "scripted failure".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(DeliveryReceipt {
            provider_id: Some(format!("msg-{}", self.sent_count())),
        })
    }
}

/// Audience double recording (list id, email) pairs.
#[derive(Default)]
pub struct MockAudience {
    pub added: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl MockAudience {
    pub fn fail_next_syncs(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudienceSync for MockAudience {
    async fn add_to_list(
        &self,
        _credentials: &AudienceCredentials,
        list_id: &str,
        profile: &ContactProfile,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DripflowError::Provider {
                provider: "audience".to_string(),
                message: "scripted failure".to_string(),
            });
        }
        self.added.lock().unwrap().push((list_id.to_string(), profile.email.clone()));
        Ok(())
    }
}

/// Scheduler that records suspensions and resumes immediately, so
/// wait nodes do not slow the test suite down.
#[derive(Default)]
pub struct InstantScheduler {
    pub suspensions: Mutex<Vec<(String, Duration)>>,
}

#[async_trait]
impl DurableScheduler for InstantScheduler {
    async fn suspend_for(
        &self,
        run_id: &str,
        duration: Duration,
    ) -> Result<()> {
        self.suspensions.lock().unwrap().push((run_id.to_string(), duration));
        Ok(())
    }
}

pub struct TestWorld {
    pub store: Arc<Store>,
    pub dispatcher: TriggerDispatcher,
    pub email: Arc<MockEmail>,
    pub audience: Arc<MockAudience>,
    pub scheduler: Arc<InstantScheduler>,
    pub events: Arc<BroadcastQueue<RunEvent>>,
}

impl TestWorld {
    pub fn new() -> Self {
        let store = Store::new();
        MemStore::new().init(&store);
        let store = Arc::new(store);

        let events = BroadcastQueue::new(64);
        let email = Arc::new(MockEmail::default());
        let audience = Arc::new(MockAudience::default());
        let scheduler = Arc::new(InstantScheduler::default());

        let executor = Arc::new(ActionExecutor::new(store.clone(), email.clone(), audience.clone(), scheduler.clone(), events.clone()));
        let interpreter = Arc::new(Interpreter::new(store.clone(), executor, events.clone()));
        let dispatcher = TriggerDispatcher::new(store.clone(), interpreter);

        Self {
            store,
            dispatcher,
            email,
            audience,
            scheduler,
            events,
        }
    }

    pub fn seed_workspace(
        &self,
        audience_credentials: bool,
    ) {
        self.store
            .workspaces()
            .create(&data::Workspace {
                id: "w1".to_string(),
                name: "Acme".to_string(),
                from_email: "hello@acme.test".to_string(),
                from_name: "Acme".to_string(),
                unsubscribe_base_url: Some("https://acme.test/unsubscribe".to_string()),
                audience_api_key: audience_credentials.then(|| "key".to_string()),
                audience_server: audience_credentials.then(|| "audience.test".to_string()),
            })
            .unwrap();
    }

    pub fn seed_contact(
        &self,
        id: &str,
        opt_in: bool,
    ) {
        self.store
            .contacts()
            .create(&data::Contact {
                id: id.to_string(),
                workspace_id: "w1".to_string(),
                email: format!("{}@example.com", id),
                first_name: "Ana".to_string(),
                marketing_opt_in: opt_in,
                timestamp: utils::time::time_millis(),
            })
            .unwrap();
    }

    pub fn seed_order(
        &self,
        id: &str,
        contact_id: &str,
        status: data::OrderStatus,
        total: i64,
    ) {
        self.store
            .orders()
            .create(&data::Order {
                id: id.to_string(),
                contact_id: contact_id.to_string(),
                status,
                total_amount: total,
                funnel_id: None,
                items: vec![],
                completed_at: utils::time::time_millis(),
            })
            .unwrap();
    }

    pub fn seed_template(
        &self,
        id: &str,
        kind: data::TemplateKind,
        group: Option<(&str, i64)>,
    ) {
        self.store
            .templates()
            .create(&data::Template {
                id: id.to_string(),
                workspace_id: "w1".to_string(),
                subject: format!("subject {}", id),
                body: "<p>hi</p>".to_string(),
                kind,
                group_id: group.map(|(g, _)| g.to_string()),
                group_order: group.map(|(_, n)| n).unwrap_or_default(),
                timestamp: utils::time::time_millis(),
            })
            .unwrap();
    }

    /// Deploy a flow plus an enabled trigger row for it.
    pub fn deploy(
        &self,
        flow: &FlowModel,
        trigger_kind: &str,
    ) {
        self.store.deploy(flow).unwrap();
        self.store
            .triggers()
            .create(&data::Trigger {
                id: "trig1".to_string(),
                flow_id: flow.id.clone(),
                kind: trigger_kind.to_string(),
                enabled: true,
                timestamp: utils::time::time_millis(),
            })
            .unwrap();
    }

    pub fn runs(&self) -> Vec<data::Run> {
        self.store.runs().query(&dripflow::store::query::Query::new()).unwrap().rows
    }

    pub fn steps_of(
        &self,
        run_id: &str,
    ) -> Vec<data::RunStep> {
        self.store
            .run_steps()
            .query(&dripflow::store::query::Query::new().filter("run_id", run_id).order("seq", false))
            .unwrap()
            .rows
    }

    pub fn deliveries(&self) -> Vec<data::Delivery> {
        self.store.deliveries().query(&dripflow::store::query::Query::new()).unwrap().rows
    }
}

pub fn action(
    id: &str,
    kind: ActionKind,
) -> Action {
    Action {
        id: id.to_string(),
        flow_id: "f1".to_string(),
        enabled: true,
        kind,
    }
}

pub fn edge(
    id: &str,
    source: &str,
    target: &str,
) -> EdgeModel {
    EdgeModel {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        kind: EdgeKind::Simple,
        branch: None,
    }
}

pub fn boolean_edge(
    id: &str,
    source: &str,
    target: &str,
    branch: BooleanBranch,
) -> EdgeModel {
    EdgeModel {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        kind: EdgeKind::Boolean,
        branch: Some(branch),
    }
}

pub fn flow(
    actions: Vec<Action>,
    edges: Vec<EdgeModel>,
) -> FlowModel {
    FlowModel {
        id: "f1".to_string(),
        workspace_id: "w1".to_string(),
        name: "test flow".to_string(),
        enabled: true,
        paused: false,
        trigger_node_id: "t1".to_string(),
        actions,
        edges,
    }
}
