//! # Dripflow
//!
//! Dripflow is an embeddable marketing automation engine written in Rust.
//! It interprets directed graphs of automation steps (delays, conditional
//! branches, outbound email, audience-list sync) in response to business
//! events such as a new contact signing up or an order completing.
//!
//! ## Core Features
//!
//! - **Durable runs**: every step is persisted before and after its effect,
//!   and wait nodes suspend without holding storage resources
//! - **Async Execution**: powered by `tokio`; trigger dispatch is
//!   fire-and-forget through a bounded queue
//! - **Pluggable Storage**: in-memory storage (testing) and PostgreSQL
//!   (production)
//! - **Provider seams**: email delivery and audience sync are traits, with
//!   HTTP implementations as the production defaults
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dripflow::{EngineBuilder, FlowModel, TriggerInvocation};
//!
//! let engine = EngineBuilder::new().build().unwrap();
//! engine.launch();
//!
//! // Deploy a flow, then fire a trigger for a contact
//! let flow = FlowModel::from_json(json_str)?;
//! engine.deploy(&flow)?;
//! engine.dispatch(TriggerInvocation::for_contact("trigger1", "contact1"))?;
//! ```

mod builder;
pub mod common;
pub mod conditions;
mod config;
pub mod dispatcher;
mod engine;
mod error;
pub mod events;
pub mod executor;
pub mod graph;
pub mod interpreter;
pub mod model;
pub mod providers;
pub mod scheduler;
pub mod store;
pub mod utils;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use config::{Config, EmailConfig, PostgresConfig, StoreConfig, StoreType};
pub use engine::Engine;
pub use error::DripflowError;
pub use events::RunEvent;
pub use model::*;

/// Result type alias for Dripflow operations.
pub type Result<T> = std::result::Result<T, DripflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
