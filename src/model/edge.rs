use serde::{Deserialize, Serialize};

use crate::model::action::ActionId;

/// Directed link between two nodes of a flow.
///
/// `source` may also be the flow's synthetic trigger node id. A node
/// has either exactly one outgoing simple edge, exactly two outgoing
/// boolean edges with complementary branches, or none; the invariant
/// is checked once when the flow graph is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeModel {
    pub id: String,
    pub source: String,
    pub target: ActionId,
    #[serde(default)]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<BooleanBranch>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Simple,
    Boolean,
}

/// Which half of a boolean pair an edge carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BooleanBranch {
    True,
    False,
}
