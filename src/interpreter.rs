//! The run interpreter loop.
//!
//! Drives one run from its first node to completion, handing each node
//! to the executor and persisting the terminal state. Cyclic flows are
//! legal; the loop bounds the number of hops instead of rejecting
//! cycles at build time.

use std::sync::Arc;

use tracing::{error, info};

use crate::{
    DripflowError, Result,
    common::BroadcastQueue,
    events::RunEvent,
    executor::ActionExecutor,
    model::Action,
    store::{Store, StoreSession, data},
    utils,
};

/// Upper bound on nodes executed per run. Generous for real marketing
/// flows; runaway cycles hit it instead of looping forever.
pub const MAX_STEPS_PER_RUN: usize = 1024;

pub struct Interpreter {
    store: Arc<Store>,
    executor: Arc<ActionExecutor>,
    events: Arc<BroadcastQueue<RunEvent>>,
}

impl Interpreter {
    pub fn new(
        store: Arc<Store>,
        executor: Arc<ActionExecutor>,
        events: Arc<BroadcastQueue<RunEvent>>,
    ) -> Self {
        Self {
            store,
            executor,
            events,
        }
    }

    /// Execute a run to completion, starting at `first`.
    ///
    /// A run that reaches a terminal node is persisted completed; a
    /// run stopped by a fatal error stays pending so it does not
    /// satisfy the dispatcher's completed-run gate. The `Err` path is
    /// reserved for storage failures while recording either state.
    pub async fn run(
        &self,
        mut run: data::Run,
        first: Action,
    ) -> Result<()> {
        let _ = self.events.send(RunEvent::Started {
            run_id: run.id.clone(),
            flow_id: run.flow_id.clone(),
        });
        info!("run {} started on flow {}", run.id, run.flow_id);

        let mut session = self.store.acquire();
        let mut action = first;

        for _ in 0..MAX_STEPS_PER_RUN {
            match self.executor.execute(session, &mut run, &action).await {
                Ok(outcome) => match outcome.next {
                    Some(next) => {
                        session = outcome.session;
                        action = next;
                    }
                    None => {
                        self.finish(&outcome.session, &mut run)?;
                        let _ = self.events.send(RunEvent::Completed {
                            run_id: run.id.clone(),
                        });
                        return Ok(());
                    }
                },
                Err(err) => {
                    error!("run {} halted at {}: {}", run.id, action.id, err);
                    let session = self.store.acquire();
                    self.halt(&session, &mut run)?;
                    let _ = self.events.send(RunEvent::Halted {
                        run_id: run.id.clone(),
                        error: err.to_string(),
                    });
                    return Ok(());
                }
            }
        }

        let err = DripflowError::Run(format!("run {} exceeded {} steps", run.id, MAX_STEPS_PER_RUN));
        error!("{}", err);
        let session = self.store.acquire();
        self.halt(&session, &mut run)?;
        let _ = self.events.send(RunEvent::Halted {
            run_id: run.id.clone(),
            error: err.to_string(),
        });
        Ok(())
    }

    /// Persist the terminal run state.
    fn finish(
        &self,
        session: &StoreSession,
        run: &mut data::Run,
    ) -> Result<()> {
        run.status = data::RunStatus::Completed;
        run.current_node_id = None;
        run.end_time = utils::time::time_millis();
        run.timestamp = utils::time::time_millis();
        session.runs().update(run)?;
        info!("run {} finished", run.id);
        Ok(())
    }

    /// Persist a halted run. The run stays pending with its cursor on
    /// the failed node, so the subject can go through the flow again
    /// once the configuration is fixed; the failed step carries the
    /// diagnosis.
    fn halt(
        &self,
        session: &StoreSession,
        run: &mut data::Run,
    ) -> Result<()> {
        run.timestamp = utils::time::time_millis();
        session.runs().update(run)?;
        Ok(())
    }
}
