//! Action execution.
//!
//! The executor performs one node's side effect and resolves the next
//! node. It owns the failure policy per action kind: validation
//! problems dead-end the branch, email delivery failures are recorded
//! and the run continues, audience-sync failures stop the run, and
//! missing workspace credentials are fatal configuration errors.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tracing::{info, warn};

use crate::{
    DripflowError, Result,
    common::BroadcastQueue,
    conditions,
    events::RunEvent,
    graph,
    model::{Action, ActionKind, ConditionConfig, WaitUnit},
    providers::{AudienceCredentials, AudienceSync, ContactProfile, EmailDelivery, EmailMessage, unsubscribe_url},
    scheduler::DurableScheduler,
    store::{Store, StoreSession, data, query::Query},
    utils,
};

/// Page size for order-history and delivery lookups.
const HISTORY_LIMIT: usize = 1000;

/// Result of executing one node.
///
/// Carries the session back to the interpreter because a wait node
/// consumes the inbound session and re-acquires a fresh one after
/// resume.
pub struct StepOutcome {
    pub session: StoreSession,
    /// Next node to execute, `None` when the run is finished.
    pub next: Option<Action>,
}

pub struct ActionExecutor {
    store: Arc<Store>,
    email: Arc<dyn EmailDelivery>,
    audience: Arc<dyn AudienceSync>,
    scheduler: Arc<dyn DurableScheduler>,
    events: Arc<BroadcastQueue<RunEvent>>,
}

impl ActionExecutor {
    pub fn new(
        store: Arc<Store>,
        email: Arc<dyn EmailDelivery>,
        audience: Arc<dyn AudienceSync>,
        scheduler: Arc<dyn DurableScheduler>,
        events: Arc<BroadcastQueue<RunEvent>>,
    ) -> Self {
        Self {
            store,
            email,
            audience,
            scheduler,
            events,
        }
    }

    /// Execute one node of a run.
    ///
    /// Returns `Err` only for fatal conditions; every recoverable
    /// failure is recorded on the step and expressed through the
    /// outcome's `next` field.
    pub async fn execute(
        &self,
        session: StoreSession,
        run: &mut data::Run,
        action: &Action,
    ) -> Result<StepOutcome> {
        let step = self.begin_step(&session, run, action)?;

        if !action.enabled {
            self.skip_step(&session, step, "disabled")?;
            let next = graph::resolve_next(&session, &run.flow_id, &action.id, None)?;
            return Ok(StepOutcome {
                session,
                next,
            });
        }

        match &action.kind {
            ActionKind::Empty => {
                self.complete_step(&session, step)?;
                Ok(StepOutcome {
                    session,
                    next: None,
                })
            }
            ActionKind::BooleanTest {
                condition,
            } => self.execute_boolean_test(session, run, action, step, condition.as_ref()),
            ActionKind::Wait {
                duration,
                unit,
            } => self.execute_wait(session, run, action, step, *duration, *unit).await,
            ActionKind::SendEmail {
                template_id,
            } => {
                let contact = match self.load_contact(&session, run) {
                    Ok(contact) => contact,
                    Err(err) => return self.dead_end(session, step, err),
                };
                let template = match session.templates().find(template_id) {
                    Ok(template) => template,
                    Err(_) => {
                        return self.dead_end(session, step, DripflowError::Validation(format!("template {} not found", template_id)));
                    }
                };
                self.deliver(session, run, action, step, &contact, &template).await
            }
            ActionKind::SendEmailFromTemplateGroup {
                template_group_id,
            } => self.execute_group_send(session, run, action, step, template_group_id).await,
            ActionKind::AddToAudienceList {
                audience_list_id,
            } => self.execute_audience_sync(session, run, action, step, audience_list_id).await,
        }
    }

    fn execute_boolean_test(
        &self,
        session: StoreSession,
        run: &data::Run,
        action: &Action,
        step: data::RunStep,
        condition: Option<&ConditionConfig>,
    ) -> Result<StepOutcome> {
        let Some(condition) = condition else {
            return self.dead_end(session, step, DripflowError::Validation(format!("boolean test {} has no condition", action.id)));
        };
        let Some(contact_id) = run.contact_id.clone() else {
            return self.dead_end(session, step, DripflowError::Validation(format!("run {} has no contact for boolean test", run.id)));
        };

        let orders = session.orders().query(&Query::new().filter("contact_id", contact_id.as_str()).limit(HISTORY_LIMIT))?.rows;
        match conditions::evaluate(condition, &orders) {
            Ok(verdict) => {
                self.complete_step(&session, step)?;
                let next = graph::resolve_next(&session, &run.flow_id, &action.id, Some(verdict))?;
                Ok(StepOutcome {
                    session,
                    next,
                })
            }
            Err(err) => {
                self.fail_step(&session, step, &err)?;
                // a malformed threshold is a configuration problem and
                // stops the run rather than silently picking a branch
                Err(err)
            }
        }
    }

    async fn execute_wait(
        &self,
        session: StoreSession,
        run: &data::Run,
        action: &Action,
        step: data::RunStep,
        duration: i64,
        unit: WaitUnit,
    ) -> Result<StepOutcome> {
        if duration < 1 {
            return self.dead_end(session, step, DripflowError::Validation(format!("wait {} has non-positive duration {}", action.id, duration)));
        }
        let pause: Duration = unit.to_duration(duration);
        let _ = self.events.send(RunEvent::Suspended {
            run_id: run.id.clone(),
            action_id: action.id.clone(),
            millis: pause.as_millis() as u64,
        });

        // the session must not outlive the suspension
        session.release();
        self.scheduler.suspend_for(&run.id, pause).await?;
        let session = self.store.acquire();

        self.complete_step(&session, step)?;
        let next = graph::resolve_next(&session, &run.flow_id, &action.id, None)?;
        Ok(StepOutcome {
            session,
            next,
        })
    }

    async fn execute_group_send(
        &self,
        session: StoreSession,
        run: &data::Run,
        action: &Action,
        step: data::RunStep,
        template_group_id: &str,
    ) -> Result<StepOutcome> {
        let contact = match self.load_contact(&session, run) {
            Ok(contact) => contact,
            Err(err) => return self.dead_end(session, step, err),
        };

        let templates =
            session.templates().query(&Query::new().filter("group_id", template_group_id).order("group_order", false).limit(HISTORY_LIMIT))?.rows;
        if templates.is_empty() {
            return self.dead_end(session, step, DripflowError::Validation(format!("template group {} has no templates", template_group_id)));
        }

        let sent: HashSet<String> = session
            .deliveries()
            .query(&Query::new().filter("contact_id", contact.id.as_str()).filter("status", data::DeliveryStatus::Sent.as_ref()).limit(HISTORY_LIMIT))?
            .rows
            .into_iter()
            .map(|d| d.template_id)
            .collect();

        match templates.into_iter().find(|t| !sent.contains(&t.id)) {
            Some(template) => self.deliver(session, run, action, step, &contact, &template).await,
            None => {
                // the contact has received the whole group already
                self.skip_step(&session, step, "group_exhausted")?;
                let next = graph::resolve_next(&session, &run.flow_id, &action.id, None)?;
                Ok(StepOutcome {
                    session,
                    next,
                })
            }
        }
    }

    /// Send one template to the contact and record the delivery. Email
    /// provider failures do not stop the run; the failed delivery and
    /// step are recorded and the flow proceeds.
    async fn deliver(
        &self,
        session: StoreSession,
        run: &data::Run,
        action: &Action,
        step: data::RunStep,
        contact: &data::Contact,
        template: &data::Template,
    ) -> Result<StepOutcome> {
        let marketing = template.kind == data::TemplateKind::Marketing;
        if marketing && !contact.marketing_opt_in {
            self.skip_step(&session, step, "marketing_opt_out")?;
            let next = graph::resolve_next(&session, &run.flow_id, &action.id, None)?;
            return Ok(StepOutcome {
                session,
                next,
            });
        }

        let workspace = match session.workspaces().find(&template.workspace_id) {
            Ok(workspace) => workspace,
            Err(_) => {
                let err = DripflowError::Configuration(format!("workspace {} not found", template.workspace_id));
                self.fail_step(&session, step, &err)?;
                return Err(err);
            }
        };

        let message = EmailMessage {
            to: contact.email.clone(),
            to_name: contact.first_name.clone(),
            from: workspace.from_email.clone(),
            from_name: workspace.from_name.clone(),
            subject: template.subject.clone(),
            body: template.body.clone(),
            unsubscribe_url: if marketing {
                workspace.unsubscribe_base_url.as_deref().map(|base| unsubscribe_url(base, &contact.email))
            } else {
                None
            },
        };

        match self.email.send(&message).await {
            Ok(receipt) => {
                session.deliveries().create(&data::Delivery {
                    id: utils::rowid(),
                    contact_id: contact.id.clone(),
                    template_id: template.id.clone(),
                    status: data::DeliveryStatus::Sent,
                    provider_id: receipt.provider_id,
                    error: None,
                    timestamp: utils::time::time_millis(),
                })?;
                self.complete_step(&session, step)?;
            }
            Err(err) => {
                warn!("run {} email delivery failed at {}: {}", run.id, action.id, err);
                session.deliveries().create(&data::Delivery {
                    id: utils::rowid(),
                    contact_id: contact.id.clone(),
                    template_id: template.id.clone(),
                    status: data::DeliveryStatus::Failed,
                    provider_id: None,
                    error: Some(err.to_string()),
                    timestamp: utils::time::time_millis(),
                })?;
                self.fail_step(&session, step, &err)?;
            }
        }

        let next = graph::resolve_next(&session, &run.flow_id, &action.id, None)?;
        Ok(StepOutcome {
            session,
            next,
        })
    }

    async fn execute_audience_sync(
        &self,
        session: StoreSession,
        run: &data::Run,
        action: &Action,
        step: data::RunStep,
        audience_list_id: &str,
    ) -> Result<StepOutcome> {
        let contact = match self.load_contact(&session, run) {
            Ok(contact) => contact,
            Err(err) => return self.dead_end(session, step, err),
        };
        if !contact.marketing_opt_in {
            self.skip_step(&session, step, "marketing_opt_out")?;
            let next = graph::resolve_next(&session, &run.flow_id, &action.id, None)?;
            return Ok(StepOutcome {
                session,
                next,
            });
        }

        let workspace = match session.workspaces().find(&contact.workspace_id) {
            Ok(workspace) => workspace,
            Err(_) => {
                let err = DripflowError::Configuration(format!("workspace {} not found", contact.workspace_id));
                self.fail_step(&session, step, &err)?;
                return Err(err);
            }
        };
        let credentials = match (workspace.audience_api_key, workspace.audience_server) {
            (Some(api_key), Some(server)) => AudienceCredentials {
                api_key,
                server,
            },
            _ => {
                let err = DripflowError::Configuration(format!("workspace {} has no audience credentials", workspace.id));
                self.fail_step(&session, step, &err)?;
                return Err(err);
            }
        };

        let profile = ContactProfile {
            email: contact.email.clone(),
            first_name: contact.first_name.clone(),
        };
        match self.audience.add_to_list(&credentials, audience_list_id, &profile).await {
            Ok(()) => {
                info!("run {} added contact {} to list {}", run.id, contact.id, audience_list_id);
                self.complete_step(&session, step)?;
                let next = graph::resolve_next(&session, &run.flow_id, &action.id, None)?;
                Ok(StepOutcome {
                    session,
                    next,
                })
            }
            Err(err) => {
                // unlike email, a failed audience sync stops the run:
                // later nodes usually assume list membership
                warn!("run {} audience sync failed at {}: {}", run.id, action.id, err);
                self.fail_step(&session, step, &err)?;
                Ok(StepOutcome {
                    session,
                    next: None,
                })
            }
        }
    }

    /// Record a validation failure and end the branch without
    /// failing the run.
    fn dead_end(
        &self,
        session: StoreSession,
        step: data::RunStep,
        err: DripflowError,
    ) -> Result<StepOutcome> {
        warn!("step {} dead-ended: {}", step.action_id, err);
        self.fail_step(&session, step, &err)?;
        Ok(StepOutcome {
            session,
            next: None,
        })
    }

    fn load_contact(
        &self,
        session: &StoreSession,
        run: &data::Run,
    ) -> Result<data::Contact> {
        let contact_id = run.contact_id.as_deref().ok_or_else(|| DripflowError::Validation(format!("run {} has no contact", run.id)))?;
        session.contacts().find(contact_id).map_err(|_| DripflowError::Validation(format!("contact {} not found", contact_id)))
    }

    /// Record the pending step and move the run's cursor to this node.
    fn begin_step(
        &self,
        session: &StoreSession,
        run: &mut data::Run,
        action: &Action,
    ) -> Result<data::RunStep> {
        let seq = session.run_steps().query(&Query::new().filter("run_id", run.id.as_str()).limit(1))?.count as i64;
        let step = data::RunStep {
            id: utils::rowid(),
            run_id: run.id.clone(),
            action_id: action.id.clone(),
            seq,
            status: data::StepStatus::Pending,
            error: None,
            skip_reason: None,
            started_at: utils::time::time_millis(),
            completed_at: 0,
        };
        session.run_steps().create(&step)?;

        run.current_node_id = Some(action.id.clone());
        run.timestamp = utils::time::time_millis();
        session.runs().update(run)?;

        Ok(step)
    }

    fn complete_step(
        &self,
        session: &StoreSession,
        mut step: data::RunStep,
    ) -> Result<()> {
        step.status = data::StepStatus::Completed;
        step.completed_at = utils::time::time_millis();
        session.run_steps().update(&step)?;
        let _ = self.events.send(RunEvent::StepCompleted {
            run_id: step.run_id,
            action_id: step.action_id,
        });
        Ok(())
    }

    fn fail_step(
        &self,
        session: &StoreSession,
        mut step: data::RunStep,
        err: &DripflowError,
    ) -> Result<()> {
        step.status = data::StepStatus::Failed;
        step.error = Some(err.to_string());
        step.completed_at = utils::time::time_millis();
        session.run_steps().update(&step)?;
        let _ = self.events.send(RunEvent::StepFailed {
            run_id: step.run_id,
            action_id: step.action_id,
            error: err.to_string(),
        });
        Ok(())
    }

    fn skip_step(
        &self,
        session: &StoreSession,
        mut step: data::RunStep,
        reason: &str,
    ) -> Result<()> {
        info!("step {} skipped: {}", step.action_id, reason);
        step.status = data::StepStatus::Skipped;
        step.skip_reason = Some(reason.to_string());
        step.completed_at = utils::time::time_millis();
        session.run_steps().update(&step)?;
        let _ = self.events.send(RunEvent::StepSkipped {
            run_id: step.run_id,
            action_id: step.action_id,
            reason: reason.to_string(),
        });
        Ok(())
    }
}
