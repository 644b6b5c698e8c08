use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Refunded,
}

/// Role a product played in the checkout that produced the order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductRole {
    Primary,
    Bump,
    Upsell,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    pub role: ProductRole,
}

/// Order history entity, read-only here. Condition evaluation only
/// ever looks at completed orders.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Order {
    pub id: String,
    pub contact_id: String,
    pub status: OrderStatus,
    /// Order total in minor currency units.
    pub total_amount: i64,
    pub funnel_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub completed_at: i64,
}

impl DbCollectionIden for Order {
    fn iden() -> StoreIden {
        StoreIden::Orders
    }
}
