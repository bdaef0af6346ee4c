//! Inference worker loop.
//!
//! Claims and executes at most one job at a time, only while authorized.
//! Every claimed job receives exactly one result-or-error submission, even
//! when the backend call fails; job exclusivity is the coordinator's.

use crate::config::Config;
use crate::consts::worker::{
    ERROR_BACKOFF_MS, GATED_INTERVAL_MS, JOB_COMPLETE_INTERVAL_MS, JOB_POLL_INTERVAL_MS,
};
use crate::coordinator::Coordinator;
use crate::gate::GateTracker;
use crate::inference::{resolve_model, InferenceBackend};
use crate::job::JobOutcome;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// What one pass over the loop body did; drives the wait branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceOutcome {
    /// The state query failed.
    StateFailed,
    /// The coordinator reports this host disabled.
    NotAuthorized,
    /// No job was queued; a normal idle pass.
    Idle,
    /// The claim call failed.
    ClaimFailed,
    /// A job ran and its result was reported.
    Completed,
    /// The backend failed; the error outcome was reported for the job.
    JobErrored,
    /// The result-or-error report could not be delivered.
    ReportFailed,
}

/// Explicit backoff policy: every outcome maps to exactly one wait branch.
pub fn delay_for(outcome: InferenceOutcome) -> Duration {
    match outcome {
        InferenceOutcome::Completed | InferenceOutcome::JobErrored => {
            Duration::from_millis(JOB_COMPLETE_INTERVAL_MS)
        }
        InferenceOutcome::Idle => Duration::from_millis(JOB_POLL_INTERVAL_MS),
        InferenceOutcome::NotAuthorized => Duration::from_millis(GATED_INTERVAL_MS),
        InferenceOutcome::StateFailed
        | InferenceOutcome::ClaimFailed
        | InferenceOutcome::ReportFailed => Duration::from_millis(ERROR_BACKOFF_MS),
    }
}

/// One pass: gate check, claim, generate, report. A job claimed here is
/// always reported, even if the gate flips while it runs.
pub async fn cycle(
    config: &Config,
    coordinator: &dyn Coordinator,
    backend: &dyn InferenceBackend,
    gate: &mut GateTracker,
) -> InferenceOutcome {
    match coordinator.node_state(&config.host_id).await {
        Ok(state) => {
            gate.observe_state(&state);
        }
        Err(e) => {
            warn!("state query failed: {}", e);
            gate.observe_state_failure();
            return InferenceOutcome::StateFailed;
        }
    }
    if !gate.may_submit() {
        return InferenceOutcome::NotAuthorized;
    }

    let job = match coordinator
        .claim_job(&config.host_id, &config.device_id)
        .await
    {
        Ok(Some(job)) => job,
        // Losing the claim race or an empty queue are the same idle answer.
        Ok(None) => return InferenceOutcome::Idle,
        Err(e) => {
            warn!("job claim failed: {}", e);
            return InferenceOutcome::ClaimFailed;
        }
    };
    info!("claimed {}", job);

    let model = resolve_model(&job.model_id);
    let (outcome, errored) = match backend.generate(model, &job.prompt).await {
        Ok(text) => {
            info!("job {} generated {} chars on {}", job.id, text.len(), model);
            (JobOutcome::success(text), false)
        }
        Err(e) => {
            warn!("backend failed for job {}: {}", job.id, e);
            (JobOutcome::failure(e.to_string()), true)
        }
    };

    match coordinator.submit_job_result(&job.id, &outcome).await {
        Ok(()) => {
            info!("job {} reported", job.id);
            if errored {
                InferenceOutcome::JobErrored
            } else {
                InferenceOutcome::Completed
            }
        }
        Err(e) => {
            warn!("failed to report job {}: {}", job.id, e);
            InferenceOutcome::ReportFailed
        }
    }
}

/// Loop driver; every wait observes the shutdown channel.
pub async fn run(
    config: Arc<Config>,
    coordinator: Arc<dyn Coordinator>,
    backend: Arc<dyn InferenceBackend>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut gate = GateTracker::new();
    info!("inference worker started");
    loop {
        let outcome = cycle(&config, coordinator.as_ref(), backend.as_ref(), &mut gate).await;
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = tokio::time::sleep(delay_for(outcome)) => {}
        }
    }
    info!("inference worker stopped");
}
