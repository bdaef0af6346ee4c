//! Worker supervision.
//!
//! Spawns the mining and inference loops as independently cancellable
//! tasks and hands back their join handles. The loops share nothing but
//! the coordinator's server-side state.

use crate::config::Config;
use crate::coordinator::{Coordinator, CoordinatorClient};
use crate::inference::{BackendClient, InferenceBackend};
use crate::system;
use crate::workers;
use log::info;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub fn start_workers(
    config: Arc<Config>,
    coordinator: Arc<CoordinatorClient>,
    backend: Arc<BackendClient>,
    shutdown: &broadcast::Sender<()>,
) -> Vec<JoinHandle<()>> {
    // The identity, including the reported GPU model, is fixed for the
    // process lifetime.
    let gpu_model = config
        .gpu_override
        .clone()
        .or_else(system::detect_gpu_model);
    match &gpu_model {
        Some(model) => info!("reporting GPU model {:?}", model),
        None => info!("no GPU model detected"),
    }

    let mining = {
        let config = config.clone();
        let coordinator: Arc<dyn Coordinator> = coordinator.clone();
        tokio::spawn(workers::mining::run(
            config,
            coordinator,
            gpu_model,
            shutdown.subscribe(),
        ))
    };

    let inference = {
        let coordinator: Arc<dyn Coordinator> = coordinator;
        let backend: Arc<dyn InferenceBackend> = backend;
        tokio::spawn(workers::inference::run(
            config,
            coordinator,
            backend,
            shutdown.subscribe(),
        ))
    };

    vec![mining, inference]
}
