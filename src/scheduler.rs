//! Durable suspension for wait nodes.
//!
//! The executor releases its store session, asks the scheduler to
//! suspend the run, and re-acquires a session after resume. The
//! default scheduler parks the run's worker task on the tokio timer;
//! a deployment that must survive restarts swaps in an implementation
//! backed by an external timer service.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::Result;

/// Suspend-and-resume seam between the executor and wall-clock time.
#[async_trait]
pub trait DurableScheduler: Send + Sync {
    /// Suspend the run for the given interval, returning once the
    /// interval has elapsed.
    async fn suspend_for(
        &self,
        run_id: &str,
        duration: Duration,
    ) -> Result<()>;
}

/// In-process scheduler backed by the tokio timer.
#[derive(Debug, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DurableScheduler for TokioScheduler {
    async fn suspend_for(
        &self,
        run_id: &str,
        duration: Duration,
    ) -> Result<()> {
        info!("run {} suspended for {:?}", run_id, duration);
        tokio::time::sleep(duration).await;
        Ok(())
    }
}
