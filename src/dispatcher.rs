//! Trigger dispatch.
//!
//! Maps an inbound [`TriggerInvocation`] to at most one new run. The
//! gate order is fixed: trigger exists and is enabled, flow is enabled
//! and not paused, the subject id matches the trigger kind, and the
//! subject has never been through this flow before. Invocations that
//! fail a gate are dropped quietly; malformed ones are reported to the
//! caller.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    DripflowError, Result,
    graph::FlowGraph,
    interpreter::Interpreter,
    model::{FlowModel, TriggerInvocation, TriggerKind},
    store::{Store, data, query::Query},
    utils,
};

pub struct TriggerDispatcher {
    store: Arc<Store>,
    interpreter: Arc<Interpreter>,
}

impl TriggerDispatcher {
    pub fn new(
        store: Arc<Store>,
        interpreter: Arc<Interpreter>,
    ) -> Self {
        Self {
            store,
            interpreter,
        }
    }

    /// Handle one trigger firing.
    ///
    /// `Ok(())` covers both "run started and finished" and "invocation
    /// dropped by a gate"; `Err` means the invocation itself was
    /// malformed or the store failed.
    pub async fn dispatch(
        &self,
        invocation: TriggerInvocation,
    ) -> Result<()> {
        let session = self.store.acquire();

        let trigger = match session.triggers().find(&invocation.trigger_id) {
            Ok(trigger) => trigger,
            Err(_) => {
                warn!("trigger {} not found; invocation dropped", invocation.trigger_id);
                return Ok(());
            }
        };
        if !trigger.enabled {
            debug!("trigger {} disabled; invocation dropped", trigger.id);
            return Ok(());
        }
        let kind: TriggerKind = match trigger.kind.parse() {
            Ok(kind) => kind,
            Err(_) => {
                warn!("trigger {} has unknown kind {}; invocation dropped", trigger.id, trigger.kind);
                return Ok(());
            }
        };

        let flow = session.flows().find(&trigger.flow_id)?;
        if !flow.enabled {
            debug!("flow {} disabled; invocation dropped", flow.id);
            return Ok(());
        }
        if flow.paused {
            debug!("flow {} paused; invocation dropped", flow.id);
            return Ok(());
        }

        let (subject_column, subject_id) = match kind {
            TriggerKind::NewContact => ("contact_id", invocation.contact_id.as_deref()),
            TriggerKind::NewOrder => ("order_id", invocation.order_id.as_deref()),
        };
        let subject_id = subject_id
            .ok_or_else(|| DripflowError::Trigger(format!("invocation of trigger {} is missing {}", trigger.id, kind.required_subject())))?;

        // read-then-act: a subject that finished this flow never goes
        // through it again; in-flight runs do not block (best-effort,
        // not exactly-once)
        let prior = session
            .runs()
            .query(
                &Query::new()
                    .filter("flow_id", flow.id.as_str())
                    .filter(subject_column, subject_id)
                    .filter("status", data::RunStatus::Completed.as_ref())
                    .limit(1),
            )?;
        if prior.count > 0 {
            debug!("flow {} already completed for {} {}; invocation dropped", flow.id, subject_column, subject_id);
            return Ok(());
        }

        let model = FlowModel::from_json(&flow.data)?;
        let graph = FlowGraph::build(&model)?;
        let Some(first) = graph.first_action()?.cloned() else {
            warn!("flow {} has no first action; invocation dropped", flow.id);
            return Ok(());
        };

        let contact_id = match kind {
            TriggerKind::NewContact => Some(subject_id.to_string()),
            // order triggers still execute contact-scoped nodes, so
            // resolve the contact through the order
            TriggerKind::NewOrder => Some(session.orders().find(subject_id)?.contact_id),
        };
        let order_id = match kind {
            TriggerKind::NewContact => None,
            TriggerKind::NewOrder => Some(subject_id.to_string()),
        };

        let run = data::Run {
            id: utils::longid(),
            flow_id: flow.id.clone(),
            trigger_id: trigger.id.clone(),
            contact_id,
            order_id,
            status: data::RunStatus::Pending,
            current_node_id: None,
            start_time: utils::time::time_millis(),
            end_time: 0,
            timestamp: utils::time::time_millis(),
        };
        session.runs().create(&run)?;
        session.release();

        self.interpreter.run(run, first).await
    }
}
