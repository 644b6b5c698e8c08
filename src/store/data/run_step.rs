use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// Status of a single node visit within a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Skipped,
}

/// One row per node visited in a run.
///
/// Written with status `pending` immediately before the node executes
/// and finalized immediately after, so a crash leaves a visible trace
/// of where the run was.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunStep {
    pub id: String,
    pub run_id: String,
    pub action_id: String,
    /// Position of this step within the run, starting at 0.
    pub seq: i64,
    pub status: StepStatus,
    pub error: Option<String>,
    pub skip_reason: Option<String>,
    pub started_at: i64,
    /// Zero until the step is finalized.
    pub completed_at: i64,
}

impl DbCollectionIden for RunStep {
    fn iden() -> StoreIden {
        StoreIden::RunSteps
    }
}
