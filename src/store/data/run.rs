use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// Status of a run. A run is terminal once completed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Pending,
    Completed,
}

/// One execution instance of a flow for one contact or order.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Run {
    pub id: String,
    pub flow_id: String,
    pub trigger_id: String,
    /// Subject of a new-contact trigger.
    pub contact_id: Option<String>,
    /// Subject of a new-order trigger.
    pub order_id: Option<String>,
    pub status: RunStatus,
    /// Node the interpreter is at; cleared when the run completes.
    pub current_node_id: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub timestamp: i64,
}

impl DbCollectionIden for Run {
    fn iden() -> StoreIden {
        StoreIden::Runs
    }
}
