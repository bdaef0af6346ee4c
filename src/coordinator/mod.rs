//! Coordinator service client.
//!
//! Typed request/response wrappers around the coordinator's HTTP endpoints.
//! The client carries no retry logic of its own; worker loops own backoff.

pub mod client;
pub mod error;
pub mod types;

pub use client::CoordinatorClient;
pub use error::CoordinatorError;

use crate::job::{Job, JobOutcome};
use types::{BindRequest, BindResponse, NodeState, ShareReceipt, ShareSubmission};

#[async_trait::async_trait]
pub trait Coordinator: Send + Sync {
    /// Idempotent device registration; safe to call every cycle.
    async fn bind(&self, request: &BindRequest) -> Result<BindResponse, CoordinatorError>;

    /// Read-only gate snapshot for one host; safe to poll frequently.
    async fn node_state(&self, host_id: &str) -> Result<NodeState, CoordinatorError>;

    /// Credit one share at the claimed difficulty.
    async fn submit_share(
        &self,
        share: &ShareSubmission,
    ) -> Result<ShareReceipt, CoordinatorError>;

    /// Claim the next queued job, if any. `Ok(None)` is the normal
    /// "no work right now" answer, not an error.
    async fn claim_job(
        &self,
        host_id: &str,
        device_id: &str,
    ) -> Result<Option<Job>, CoordinatorError>;

    /// Report the terminal outcome for a claimed job. Called exactly once
    /// per claim, whether the job succeeded or failed.
    async fn submit_job_result(
        &self,
        job_id: &str,
        outcome: &JobOutcome,
    ) -> Result<(), CoordinatorError>;
}
