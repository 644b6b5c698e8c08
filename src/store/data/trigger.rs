use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// Stored trigger row, created when a flow is activated.
///
/// `kind` is parsed into [`crate::model::TriggerKind`] at dispatch
/// time; an unknown kind dead-ends the invocation.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Trigger {
    pub id: String,
    pub flow_id: String,
    pub kind: String,
    pub enabled: bool,
    pub timestamp: i64,
}

impl DbCollectionIden for Trigger {
    fn iden() -> StoreIden {
        StoreIden::Triggers
    }
}
