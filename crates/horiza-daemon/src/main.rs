// crates/horiza-daemon/src/main.rs
//
// Binary entrypoint for the Horiza Protocol daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, restores
// the engine from disk (or builds genesis), moves it onto the engine actor,
// and runs the RPC server and epoch scheduler until Ctrl-C. On shutdown the
// engine is handed back by the actor and persisted.

mod config;
mod epoch_events;
mod error;
mod persistence;
mod scheduler;
mod state;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::sync::{broadcast, watch, Mutex};

use config::DaemonConfig;
use epoch_events::EpochEvent;
use persistence::StateStore;
use scheduler::EpochScheduler;
use state::{NodeState, NodeStateMachine};

use horiza_economics::{Hz, InMemoryLedger, Protocol};
use horiza_rpc::{EngineHandle, HorizaRpcServer, RpcConfig};

/// Horiza Protocol daemon: voting escrow, gauges, and emission.
#[derive(Parser, Debug)]
#[command(name = "horiza-daemon", version = "0.1.0", about = "Horiza Protocol daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.horiza/config.toml")]
    config: String,

    /// Data directory; overrides the config file.
    #[arg(long)]
    data_dir: Option<String>,

    /// RPC port; overrides the config file.
    #[arg(long)]
    rpc_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. Logged once tracing is up.
    let loaded = DaemonConfig::load(&args.config);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // CLI flags override the config file.
    if let Some(data_dir) = args.data_dir.clone() {
        daemon_config.data_dir = data_dir;
    }
    if let Some(port) = args.rpc_port {
        daemon_config.rpc_port = port;
    }

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", args.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            args.config,
            e
        ),
    }

    let data_dir = daemon_config.data_dir();
    tracing::info!("Horiza Protocol Daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", data_dir);
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );
    tracing::info!("Epoch duration: {}s", daemon_config.epoch_duration);

    let mut machine = NodeStateMachine::new();
    machine.transition(NodeState::Recovering)?;

    // ---------------------------------------------------------------
    // Restore the engine or build genesis.
    // ---------------------------------------------------------------
    let store = StateStore::new(&data_dir);
    let engine = match store.load()? {
        Some(engine) => engine,
        None => {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let protocol_config = daemon_config.protocol_config(now);
            let ledger = InMemoryLedger::with_balances(
                daemon_config
                    .genesis_balances
                    .iter()
                    .map(|b| (b.account, b.amount)),
            )?;
            tracing::info!(
                genesis_timestamp = protocol_config.genesis_timestamp,
                accounts = daemon_config.genesis_balances.len(),
                supply = %Hz::from_wei(ledger.total_supply()),
                "No persisted state; starting from genesis"
            );
            let engine = Protocol::new(protocol_config, ledger)?;
            store.save(engine.state().clone(), engine.ledger().clone())?;
            engine
        }
    };
    let operator = engine.roles().operator;

    machine.transition(NodeState::Ready)?;
    let lifecycle = Arc::new(Mutex::new(machine));

    let (engine_handle, engine_task) = EngineHandle::spawn(engine);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (event_tx, _) = broadcast::channel::<EpochEvent>(64);

    // Event logger.
    let mut event_rx = event_tx.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match event {
                EpochEvent::EpochAdvanced { epoch, at } => {
                    tracing::info!("=== EPOCH {} === (t={})", epoch, at);
                }
                EpochEvent::EmissionDistributed { split } => {
                    tracing::info!(
                        "Epoch {} emission {} HZ (team {}, LP {}, holders {}, gauges {})",
                        split.epoch,
                        Hz::from_wei(split.emission),
                        Hz::from_wei(split.team),
                        Hz::from_wei(split.liquidity_providers),
                        Hz::from_wei(split.holders),
                        Hz::from_wei(split.allocated_to_gauges)
                    );
                }
                EpochEvent::SnapshotWritten { epoch, holders, path } => {
                    tracing::info!(
                        "Snapshot for epoch {} ({} holders) at {}",
                        epoch,
                        holders,
                        path.display()
                    );
                }
            }
        }
    });

    // Spawn epoch scheduler.
    let scheduler_task = if daemon_config.auto_epoch {
        let scheduler = EpochScheduler::new(
            engine_handle.clone(),
            store.clone(),
            operator,
            event_tx.clone(),
            lifecycle.clone(),
        )
        .with_poll_interval(Duration::from_secs(daemon_config.poll_interval_secs.max(1)));
        let rx = shutdown_rx.clone();
        Some(tokio::spawn(async move { scheduler.run(rx).await }))
    } else {
        tracing::info!("Automatic epoch advance disabled; use epoch/update and emission/distribute");
        None
    };

    // Spawn RPC server.
    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    let rpc_server =
        HorizaRpcServer::new(rpc_config, engine_handle.clone()).with_start_time(Instant::now());
    let mut rpc_shutdown = shutdown_rx.clone();
    let rpc_task = tokio::spawn(async move {
        let signal = async move {
            let _ = rpc_shutdown.changed().await;
        };
        if let Err(e) = rpc_server.start_with_shutdown(signal).await {
            tracing::error!("RPC server error: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");

    lifecycle.lock().await.transition(NodeState::ShuttingDown)?;
    let _ = shutdown_tx.send(true);

    if let Some(task) = scheduler_task {
        let _ = task.await;
    }
    let _ = rpc_task.await;

    // The actor hands the engine back once the last handle is gone.
    drop(engine_handle);
    let engine = engine_task.await?;
    let (state, ledger) = engine.into_parts();
    let path = store.save(state, ledger)?;
    tracing::info!("Engine state saved to {}", path.display());
    tracing::info!("Horiza daemon shut down gracefully");

    Ok(())
}
