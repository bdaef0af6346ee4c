//! Gate state machine.
//!
//! Tracks the coordinator's latest answer to "may this device work now".
//! Authorization is re-affirmed from fresh responses every cycle and never
//! cached as sticky; the one concession is a probabilistic skip that lets a
//! verified miner continue a share burst without re-querying every cycle,
//! an explicit and bounded staleness window.

use crate::consts::worker::RECHECK_PROBABILITY;
use crate::coordinator::types::{BindResponse, NodeState};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// The coordinator has not (or no longer) acknowledged the binding.
    Unbound,
    /// Bound, but not currently enabled for work.
    Disabled,
    /// Enabled with an unverified GPU; job execution only.
    EnabledUnverified,
    /// Enabled and GPU-verified; mining and job execution.
    EnabledVerified,
}

#[derive(Debug)]
pub struct GateTracker {
    state: GateState,
    reported_gpu: Option<String>,
}

impl GateTracker {
    pub fn new() -> Self {
        GateTracker {
            state: GateState::Unbound,
            reported_gpu: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.state != GateState::Unbound
    }

    /// Whether job claims and result submissions are permitted.
    pub fn may_submit(&self) -> bool {
        matches!(
            self.state,
            GateState::EnabledUnverified | GateState::EnabledVerified
        )
    }

    /// Whether share production is permitted. Mining additionally requires
    /// the coordinator-owned GPU verification flag.
    pub fn may_mine(&self) -> bool {
        self.state == GateState::EnabledVerified
    }

    /// GPU model the coordinator last reported for this host.
    pub fn reported_gpu(&self) -> Option<&str> {
        self.reported_gpu.as_deref()
    }

    /// Fold one bind response in. A refusal demotes all the way to
    /// [`GateState::Unbound`]; an affirmative bind never demotes, so
    /// repeated binds with the same identity are harmless.
    pub fn observe_bind(&mut self, response: &BindResponse) -> GateState {
        if response.is_bound() {
            if self.state == GateState::Unbound {
                self.state = GateState::Disabled;
            }
        } else {
            self.state = GateState::Unbound;
        }
        self.state
    }

    /// A failed bind call counts as "not authorized this cycle".
    pub fn observe_bind_failure(&mut self) -> GateState {
        self.state = GateState::Unbound;
        self.state
    }

    /// Fold one state query in.
    pub fn observe_state(&mut self, state: &NodeState) -> GateState {
        self.reported_gpu = state.gpu_reported_model.clone();
        self.state = if !state.enabled {
            GateState::Disabled
        } else if state.is_verified() {
            GateState::EnabledVerified
        } else {
            GateState::EnabledUnverified
        };
        self.state
    }

    /// A failed state query keeps the binding but drops authorization.
    pub fn observe_state_failure(&mut self) -> GateState {
        if self.state != GateState::Unbound {
            self.state = GateState::Disabled;
        }
        self.state
    }

    /// Whether this cycle must re-affirm the gate remotely. Always true
    /// until verified; afterwards true with [`RECHECK_PROBABILITY`].
    pub fn should_affirm<R: Rng>(&self, rng: &mut R) -> bool {
        if self.state != GateState::EnabledVerified {
            return true;
        }
        rng.gen::<f64>() < RECHECK_PROBABILITY
    }
}

impl Default for GateTracker {
    fn default() -> Self {
        Self::new()
    }
}
