//! Row types for the storage collections.
//!
//! Runs, run steps and deliveries are owned exclusively by the engine.
//! Flows, triggers, contacts, orders, templates and workspaces are
//! owned by other parts of the product and only read here.

mod contact;
mod delivery;
mod flow;
mod order;
mod run;
mod run_step;
mod template;
mod trigger;
mod workspace;

pub use contact::Contact;
pub use delivery::{Delivery, DeliveryStatus};
pub use flow::Flow;
pub use order::{Order, OrderItem, OrderStatus, ProductRole};
pub use run::{Run, RunStatus};
pub use run_step::{RunStep, StepStatus};
pub use template::{Template, TemplateKind};
pub use trigger::Trigger;
pub use workspace::Workspace;
