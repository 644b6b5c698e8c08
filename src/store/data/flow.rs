use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// Stored flow definition.
///
/// `data` holds the [`crate::model::FlowModel`] JSON (actions and
/// edges included). The resolver re-parses it on every hop so editor
/// changes apply to in-flight runs immediately.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Flow {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub enabled: bool,
    pub paused: bool,
    pub data: String,
    pub create_time: i64,
    pub update_time: i64,
}

impl DbCollectionIden for Flow {
    fn iden() -> StoreIden {
        StoreIden::Flows
    }
}
