use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Record of one email delivery attempt.
///
/// Sent deliveries also back the template-group dedup check: a group
/// send picks the first template the contact has not received yet.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Delivery {
    pub id: String,
    pub contact_id: String,
    pub template_id: String,
    pub status: DeliveryStatus,
    pub provider_id: Option<String>,
    pub error: Option<String>,
    pub timestamp: i64,
}

impl DbCollectionIden for Delivery {
    fn iden() -> StoreIden {
        StoreIden::Deliveries
    }
}
