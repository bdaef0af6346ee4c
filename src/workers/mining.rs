//! Mining worker loop.
//!
//! Drives bind, gate check, PoW search, and share submission, forever.
//! A failed remote call means "not authorized this cycle", never a crash;
//! the only fatal condition in the whole agent is a missing wallet at
//! startup.

use crate::config::Config;
use crate::consts::worker::{ERROR_BACKOFF_MS, GATED_INTERVAL_MS, SHARE_INTERVAL_MS};
use crate::coordinator::types::{BindRequest, ShareSubmission};
use crate::coordinator::Coordinator;
use crate::gate::GateTracker;
use crate::pow;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// What one pass over the loop body did; drives the wait branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningOutcome {
    /// The bind call failed at the transport or HTTP level.
    BindFailed,
    /// The coordinator does not (or no longer) acknowledge the binding.
    Unbound,
    /// The state query failed.
    StateFailed,
    /// Bound but disabled, or the GPU is not verified.
    Gated,
    /// A share was produced and credited.
    Submitted,
    /// A share was produced but the submission was refused or lost.
    SubmitFailed,
    /// The blocking search task died.
    SearchFailed,
}

/// Explicit backoff policy: every outcome maps to exactly one wait branch.
pub fn delay_for(outcome: MiningOutcome) -> Duration {
    match outcome {
        MiningOutcome::Submitted => Duration::from_millis(SHARE_INTERVAL_MS),
        MiningOutcome::Unbound | MiningOutcome::Gated => {
            Duration::from_millis(GATED_INTERVAL_MS)
        }
        MiningOutcome::BindFailed
        | MiningOutcome::StateFailed
        | MiningOutcome::SubmitFailed
        | MiningOutcome::SearchFailed => Duration::from_millis(ERROR_BACKOFF_MS),
    }
}

/// One pass: re-affirm the gate (unless a verified burst skips the check),
/// search, submit. No share leaves this function while the latest
/// observation is unbound or disabled.
pub async fn cycle<R: Rng>(
    config: &Config,
    coordinator: &dyn Coordinator,
    gate: &mut GateTracker,
    gpu_model: Option<&str>,
    rng: &mut R,
) -> MiningOutcome {
    if gate.should_affirm(rng) {
        let request = BindRequest {
            host_id: config.host_id.clone(),
            device_id: config.device_id.clone(),
            wallet: config.wallet.clone(),
            gpu_model: gpu_model.map(str::to_string),
        };
        match coordinator.bind(&request).await {
            Ok(response) => {
                let was_bound = gate.is_bound();
                gate.observe_bind(&response);
                if !gate.is_bound() {
                    if was_bound {
                        info!("binding lost for device {}", config.device_id);
                    }
                    return MiningOutcome::Unbound;
                }
            }
            Err(e) => {
                warn!("bind failed: {}", e);
                gate.observe_bind_failure();
                return MiningOutcome::BindFailed;
            }
        }

        match coordinator.node_state(&config.host_id).await {
            Ok(state) => {
                let before = gate.state();
                let after = gate.observe_state(&state);
                if after != before {
                    match gate.reported_gpu() {
                        Some(model) => {
                            info!("gate transition: {:?} -> {:?} (gpu {})", before, after, model)
                        }
                        None => info!("gate transition: {:?} -> {:?}", before, after),
                    }
                }
            }
            Err(e) => {
                warn!("state query failed: {}", e);
                gate.observe_state_failure();
                return MiningOutcome::StateFailed;
            }
        }

        if !gate.may_mine() {
            return MiningOutcome::Gated;
        }
    }

    // CPU-bound search; a fresh timestamp keeps repeated searches off an
    // identical input space.
    let difficulty = config.difficulty;
    let seed = format!(
        "{}-{}-{}",
        config.host_id,
        config.device_id,
        chrono::Utc::now().timestamp_millis()
    );
    let solution = match tokio::task::spawn_blocking(move || pow::search(difficulty, &seed)).await
    {
        Ok(solution) => solution,
        Err(e) => {
            warn!("search task failed: {}", e);
            return MiningOutcome::SearchFailed;
        }
    };
    info!(
        "share found: nonce={} hash={} elapsed={}ms",
        solution.nonce, solution.hash, solution.elapsed_ms
    );

    let share = ShareSubmission {
        wallet: config.wallet.clone(),
        host_id: config.host_id.clone(),
        device_id: config.device_id.clone(),
        difficulty,
    };
    match coordinator.submit_share(&share).await {
        Ok(receipt) => {
            match receipt.total {
                Some(total) => {
                    info!("share credited at difficulty {} (total {})", difficulty, total)
                }
                None => info!("share credited at difficulty {}", difficulty),
            }
            MiningOutcome::Submitted
        }
        Err(e) => {
            warn!(
                "share submission failed: {}",
                e.to_pretty().unwrap_or_else(|| e.to_string())
            );
            MiningOutcome::SubmitFailed
        }
    }
}

/// Loop driver; every wait observes the shutdown channel.
pub async fn run(
    config: Arc<Config>,
    coordinator: Arc<dyn Coordinator>,
    gpu_model: Option<String>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut gate = GateTracker::new();
    let mut rng = StdRng::from_entropy();
    info!("mining worker started (difficulty {})", config.difficulty);
    loop {
        let outcome = cycle(
            &config,
            coordinator.as_ref(),
            &mut gate,
            gpu_model.as_deref(),
            &mut rng,
        )
        .await;
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = tokio::time::sleep(delay_for(outcome)) => {}
        }
    }
    info!("mining worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateState;
    use crate::workers::testing::{test_config, StubCoordinator};
    use rand::rngs::mock::StepRng;

    fn always_affirm() -> StepRng {
        StepRng::new(0, 0)
    }

    #[tokio::test]
    async fn an_unbound_device_submits_nothing_and_waits() {
        let stub = StubCoordinator {
            bound: false,
            ..Default::default()
        };
        let mut gate = GateTracker::new();
        let outcome = cycle(
            &test_config(),
            &stub,
            &mut gate,
            None,
            &mut always_affirm(),
        )
        .await;
        assert_eq!(outcome, MiningOutcome::Unbound);
        assert!(stub.shares.lock().unwrap().is_empty());
        assert_eq!(delay_for(outcome), Duration::from_millis(GATED_INTERVAL_MS));
    }

    #[tokio::test]
    async fn a_disabled_gate_submits_nothing() {
        let stub = StubCoordinator {
            bound: true,
            enabled: false,
            ..Default::default()
        };
        let mut gate = GateTracker::new();
        let outcome = cycle(
            &test_config(),
            &stub,
            &mut gate,
            None,
            &mut always_affirm(),
        )
        .await;
        assert_eq!(outcome, MiningOutcome::Gated);
        assert!(stub.shares.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn an_unverified_gpu_blocks_mining() {
        let stub = StubCoordinator {
            bound: true,
            enabled: true,
            verified: false,
            ..Default::default()
        };
        let mut gate = GateTracker::new();
        let outcome = cycle(
            &test_config(),
            &stub,
            &mut gate,
            None,
            &mut always_affirm(),
        )
        .await;
        assert_eq!(outcome, MiningOutcome::Gated);
        assert!(stub.shares.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_verified_gate_mines_and_submits_the_difficulty() {
        let stub = StubCoordinator::verified();
        let mut gate = GateTracker::new();
        let outcome = cycle(
            &test_config(),
            &stub,
            &mut gate,
            Some("NVIDIA RTX 4090"),
            &mut always_affirm(),
        )
        .await;
        assert_eq!(outcome, MiningOutcome::Submitted);

        let shares = stub.shares.lock().unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].wallet, "0xabc");
        assert_eq!(shares[0].difficulty, 0.0);
    }

    #[tokio::test]
    async fn a_failed_bind_backs_off_and_demotes() {
        let stub = StubCoordinator {
            bind_fails: true,
            ..Default::default()
        };
        let mut gate = GateTracker::new();
        let outcome = cycle(
            &test_config(),
            &stub,
            &mut gate,
            None,
            &mut always_affirm(),
        )
        .await;
        assert_eq!(outcome, MiningOutcome::BindFailed);
        assert_eq!(gate.state(), GateState::Unbound);
        assert_eq!(delay_for(outcome), Duration::from_millis(ERROR_BACKOFF_MS));
    }

    #[tokio::test]
    async fn a_failed_submission_is_not_fatal() {
        let stub = StubCoordinator {
            share_fails: true,
            ..StubCoordinator::verified()
        };
        let mut gate = GateTracker::new();
        let outcome = cycle(
            &test_config(),
            &stub,
            &mut gate,
            None,
            &mut always_affirm(),
        )
        .await;
        assert_eq!(outcome, MiningOutcome::SubmitFailed);
    }

    #[tokio::test]
    async fn a_verified_burst_can_skip_the_remote_recheck() {
        let stub = StubCoordinator::verified();
        let mut gate = GateTracker::new();
        // First cycle affirms and mines.
        cycle(
            &test_config(),
            &stub,
            &mut gate,
            None,
            &mut always_affirm(),
        )
        .await;
        // Second cycle draws above the re-check probability and mines on
        // the previous observation.
        let mut never_affirm = StepRng::new(u64::MAX, 0);
        let outcome = cycle(&test_config(), &stub, &mut gate, None, &mut never_affirm).await;
        assert_eq!(outcome, MiningOutcome::Submitted);
        assert_eq!(stub.shares.lock().unwrap().len(), 2);
    }

    #[test]
    fn successful_cycles_wait_the_short_interval() {
        assert_eq!(
            delay_for(MiningOutcome::Submitted),
            Duration::from_millis(SHARE_INTERVAL_MS)
        );
    }
}
