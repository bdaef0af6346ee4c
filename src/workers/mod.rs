//! Worker loops.
//!
//! Two independent, indefinitely-running tasks: share mining and inference
//! job execution. They share no mutable state and talk only to the
//! coordinator; each folds its own view of the gate and owns its backoff.

pub mod inference;
pub mod mining;
