//! Tuning constants for the worker loops.

pub mod worker {
    /// Pause between accepted share submissions, to bound the work rate.
    pub const SHARE_INTERVAL_MS: u64 = 2_000;

    /// Poll interval while the device is unbound or gated off. Longer than
    /// the share interval to reduce pressure on the coordinator while idle.
    pub const GATED_INTERVAL_MS: u64 = 30_000;

    /// Poll interval while the job queue is empty.
    pub const JOB_POLL_INTERVAL_MS: u64 = 5_000;

    /// Pause after a finished job before claiming the next one.
    pub const JOB_COMPLETE_INTERVAL_MS: u64 = 1_000;

    /// Backoff after a failed or malformed remote call.
    pub const ERROR_BACKOFF_MS: u64 = 15_000;

    /// Chance per verified mining cycle of re-affirming the gate remotely
    /// instead of continuing the share burst on the last observation.
    pub const RECHECK_PROBABILITY: f64 = 0.2;
}

pub mod http {
    /// Request timeout applied to every coordinator call.
    pub const COORDINATOR_TIMEOUT_SECS: u64 = 10;

    /// Generation can be slow on large prompts; allow a much longer deadline.
    pub const BACKEND_TIMEOUT_SECS: u64 = 600;
}
