use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Contact {
    pub id: String,
    pub workspace_id: String,
    pub email: String,
    pub first_name: String,
    /// Consent for marketing communication. Checked before every
    /// marketing send and audience sync.
    pub marketing_opt_in: bool,
    pub timestamp: i64,
}

impl DbCollectionIden for Contact {
    fn iden() -> StoreIden {
        StoreIden::Contacts
    }
}
