mod config;
mod consts;
mod coordinator;
mod gate;
mod inference;
mod job;
mod pow;
mod runtime;
mod system;
mod workers;

use crate::config::Config;
use crate::coordinator::CoordinatorClient;
use crate::inference::BackendClient;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Command-line arguments
struct Args {
    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the worker agent.
    Start {
        /// Wallet identifier (overrides GRIDLINK_WALLET).
        #[arg(long, value_name = "WALLET")]
        wallet: Option<String>,

        /// Mining difficulty (overrides GRIDLINK_DIFFICULTY).
        #[arg(long, value_name = "DIFFICULTY")]
        difficulty: Option<f64>,
    },
    /// Run one local proof-of-work search and print the solution.
    Bench {
        /// Difficulty to search at.
        #[arg(long, default_value_t = 4.0)]
        difficulty: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Command::Start { wallet, difficulty } => start(wallet, difficulty).await,
        Command::Bench { difficulty } => bench(difficulty),
    }
}

/// Starts both worker loops and blocks until Ctrl-C.
async fn start(
    wallet: Option<String>,
    difficulty: Option<f64>,
) -> Result<(), Box<dyn Error>> {
    let config = match Config::from_env_with(wallet.as_deref(), difficulty) {
        Ok(config) => config,
        Err(e) => {
            // The only startup-fatal path: exit with a non-zero status.
            error!("configuration error: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "starting agent: host={} device={} coordinator={} difficulty={}",
        config.host_id, config.device_id, config.coordinator_url, config.difficulty
    );

    let config = Arc::new(config);
    let coordinator = Arc::new(CoordinatorClient::new(&config.coordinator_url));
    let backend = Arc::new(BackendClient::new(&config.backend_url));

    let (shutdown_sender, _) = broadcast::channel(1); // Only one shutdown signal needed
    let handles = runtime::start_workers(config, coordinator, backend, &shutdown_sender);

    // Trigger shutdown on Ctrl+C.
    let shutdown_on_signal = shutdown_sender.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_on_signal.send(());
        }
    });

    let mut shutdown_receiver = shutdown_sender.subscribe();
    let _ = shutdown_receiver.recv().await;
    info!("shutting down...");
    for handle in handles {
        let _ = handle.await;
    }
    info!("agent exited");
    Ok(())
}

/// Local utility: search once at the given difficulty and print the result.
fn bench(difficulty: f64) -> Result<(), Box<dyn Error>> {
    if !difficulty.is_finite() || difficulty < 0.0 {
        return Err("difficulty must be a finite number >= 0".into());
    }
    let seed = format!(
        "{}-bench-{}",
        system::machine_name(),
        chrono::Utc::now().timestamp_millis()
    );
    let solution = pow::search(difficulty, &seed);
    println!(
        "nonce={} hash={} elapsed={}ms",
        solution.nonce, solution.hash, solution.elapsed_ms
    );
    Ok(())
}
