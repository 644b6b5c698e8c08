//! Storage layer for flow definitions, run state, and business entities.
//!
//! Provides an abstraction over different storage backends:
//! - `MemStore`: In-memory storage for testing
//! - `PostgresStore`: PostgreSQL for production persistence
//!
//! Callers never touch a backend directly; they acquire a scoped
//! [`StoreSession`] per unit of work and release it before any durable
//! suspension point.

pub mod data;
mod db;
pub mod query;
mod session;
mod store;

use std::error::Error;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::{DripflowError, Result};

use query::*;

pub use db::{MemStore, PostgresStore};
pub use session::StoreSession;
pub use store::Store;

/// Maps database errors to DripflowError.
fn map_db_err(err: impl Error) -> DripflowError {
    DripflowError::Store(err.to_string())
}

/// Identifiers for different storage collections.
#[derive(Debug, Clone, AsRefStr, PartialEq, Hash, Eq, EnumIter)]
pub enum StoreIden {
    /// Flow definitions.
    #[strum(serialize = "flows")]
    Flows,
    /// Trigger rows.
    #[strum(serialize = "triggers")]
    Triggers,
    /// Run instances.
    #[strum(serialize = "runs")]
    Runs,
    /// Per-node run step records.
    #[strum(serialize = "run_steps")]
    RunSteps,
    /// Contact entities.
    #[strum(serialize = "contacts")]
    Contacts,
    /// Order history entities.
    #[strum(serialize = "orders")]
    Orders,
    /// Email delivery records.
    #[strum(serialize = "deliveries")]
    Deliveries,
    /// Email templates and template groups.
    #[strum(serialize = "templates")]
    Templates,
    /// Workspace settings and credentials.
    #[strum(serialize = "workspaces")]
    Workspaces,
}

/// Paginated query result.
#[derive(Debug, Deserialize, Serialize)]
pub struct PageData<T> {
    /// Total number of matching records.
    pub count: usize,
    /// Current page number (1-based).
    pub page_num: usize,
    /// Total number of pages.
    pub page_count: usize,
    /// Number of records per page.
    pub page_size: usize,
    /// Records in the current page.
    pub rows: Vec<T>,
}

/// Trait for types that can identify their storage collection.
pub trait DbCollectionIden {
    /// Returns the collection identifier for this type.
    fn iden() -> StoreIden;
}

/// Trait for database collection operations.
pub trait DbCollection: Send + Sync {
    /// The type of items stored in this collection.
    type Item;

    /// Checks if a record with the given ID exists.
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool>;

    /// Finds a record by ID.
    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item>;

    /// Queries records with filtering, ordering and pagination.
    fn query(
        &self,
        query: &Query,
    ) -> Result<PageData<Self::Item>>;

    /// Creates a new record.
    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Updates an existing record.
    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Deletes a record by ID.
    fn delete(
        &self,
        id: &str,
    ) -> Result<bool>;
}

/// Trait for database store initialization.
pub trait DbStore {
    /// Initializes the database and registers collections with the store.
    fn init(
        &self,
        s: &Store,
    );
}
