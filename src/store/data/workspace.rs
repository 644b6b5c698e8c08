use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// Workspace settings read by the engine: sender identity, public
/// unsubscribe base URL, and audience-sync credentials.
///
/// Absent audience credentials are a fatal configuration error for any
/// run reaching an add-to-audience-list node.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub from_email: String,
    pub from_name: String,
    pub unsubscribe_base_url: Option<String>,
    pub audience_api_key: Option<String>,
    pub audience_server: Option<String>,
}

impl DbCollectionIden for Workspace {
    fn iden() -> StoreIden {
        StoreIden::Workspaces
    }
}
