//! Editor-owned flow definitions, read-only at runtime.
//!
//! Flows, actions, edges and triggers are authored by the (out-of-scope)
//! graph editor and persisted in the store; the engine only reads them.
//! Runs and run steps are engine-owned and live in [`crate::store::data`].

mod action;
mod edge;
mod flow;
mod trigger;

pub use action::{Action, ActionId, ActionKind, ConditionConfig, WaitUnit};
pub use edge::{BooleanBranch, EdgeKind, EdgeModel};
pub use flow::FlowModel;
pub use trigger::{TriggerInvocation, TriggerKind};
