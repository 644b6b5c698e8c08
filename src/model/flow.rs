use serde::{Deserialize, Serialize};

use crate::{
    Result,
    model::{action::Action, edge::EdgeModel},
};

/// A saved automation graph of trigger and action nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowModel {
    pub id: String,
    pub workspace_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub paused: bool,
    /// Synthetic node id used as the source of the flow's entry edge.
    pub trigger_node_id: String,
    pub actions: Vec<Action>,
    pub edges: Vec<EdgeModel>,
}

impl FlowModel {
    /// Parse a flow definition from its stored JSON form.
    pub fn from_json(data: &str) -> Result<Self> {
        let model = serde_json::from_str(data)?;
        Ok(model)
    }

    /// Serialize the flow definition for storage.
    pub fn to_json(&self) -> Result<String> {
        let data = serde_json::to_string(self)?;
        Ok(data)
    }
}
