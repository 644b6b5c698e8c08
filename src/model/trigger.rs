use serde::{Deserialize, Serialize};

/// Business events that can start a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TriggerKind {
    NewContact,
    NewOrder,
}

impl TriggerKind {
    /// Name of the subject id this trigger kind requires on an
    /// invocation.
    pub fn required_subject(&self) -> &'static str {
        match self {
            TriggerKind::NewContact => "contact_id",
            TriggerKind::NewOrder => "order_id",
        }
    }
}

/// Inbound invocation contract.
///
/// Domain handlers (contact creation, order completion) enqueue one of
/// these per trigger firing; the engine consumes it as one independent
/// unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerInvocation {
    pub trigger_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl TriggerInvocation {
    /// Invocation for a new-contact firing.
    pub fn for_contact(
        trigger_id: impl Into<String>,
        contact_id: impl Into<String>,
    ) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            contact_id: Some(contact_id.into()),
            order_id: None,
        }
    }

    /// Invocation for a new-order firing.
    pub fn for_order(
        trigger_id: impl Into<String>,
        order_id: impl Into<String>,
    ) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            contact_id: None,
            order_id: Some(order_id.into()),
        }
    }
}
