//! Run lifecycle events broadcast to engine subscribers.

use serde::{Deserialize, Serialize};

/// One observable transition in a run's lifecycle.
///
/// Events are advisory: the store is the source of truth and every
/// event is emitted after the corresponding row change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RunEvent {
    /// A run was created and its first step is about to execute.
    Started {
        run_id: String,
        flow_id: String,
    },
    /// A step finished its effect.
    StepCompleted {
        run_id: String,
        action_id: String,
    },
    /// A step failed; the run may still continue on its simple edge.
    StepFailed {
        run_id: String,
        action_id: String,
        error: String,
    },
    /// A step was passed through without its effect.
    StepSkipped {
        run_id: String,
        action_id: String,
        reason: String,
    },
    /// A wait node suspended the run.
    Suspended {
        run_id: String,
        action_id: String,
        millis: u64,
    },
    /// The run reached a terminal node or a dead end.
    Completed {
        run_id: String,
    },
    /// A fatal error stopped the run before a terminal node.
    Halted {
        run_id: String,
        error: String,
    },
}
