use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, StoreIden};

/// Message category. Marketing templates honor the contact's opt-out
/// and carry an unsubscribe link; transactional templates always send.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateKind {
    #[default]
    Transactional,
    Marketing,
}

/// Email template. Templates belonging to a group are ordered by
/// `group_order` and sent at most once per contact.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Template {
    pub id: String,
    pub workspace_id: String,
    pub subject: String,
    pub body: String,
    pub kind: TemplateKind,
    pub group_id: Option<String>,
    pub group_order: i64,
    pub timestamp: i64,
}

impl DbCollectionIden for Template {
    fn iden() -> StoreIden {
        StoreIden::Templates
    }
}
