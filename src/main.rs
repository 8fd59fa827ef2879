use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::{net::TcpListener, sync::broadcast::error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gymlog::{
    catalog::ExerciseCatalog,
    clock::SystemClock,
    config::AppConfig,
    core::lifecycle::{LifecycleConfig, LifecycleManager},
    http::{self, AppState},
    persist::{memory::MemoryGateway, sqlite::SqliteGateway},
    runtime::handle::{WorkoutHandle, spawn_gymlog},
};

#[derive(Debug, Parser)]
#[command(name = "gymlog", version, about = "Workout templates, timed sessions, and history")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Insert the sample workout.
    Seed(SeedArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "GYMLOG_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    #[arg(long, env = "GYMLOG_DATABASE", default_value = "gymlog.db")]
    database: PathBuf,
    /// Exercise catalog JSON used to enrich workout responses.
    #[arg(long, env = "GYMLOG_CATALOG")]
    catalog: Option<PathBuf>,
    /// Keep all data in memory; nothing survives a restart.
    #[arg(long, env = "GYMLOG_MEMORY")]
    memory: bool,
    /// Reject a repeat completion of the same workout within this many seconds. 0 disables.
    #[arg(long, env = "GYMLOG_DUPLICATE_WINDOW_SECS", default_value_t = 0)]
    duplicate_window_secs: u64,
}

impl ServeArgs {
    fn into_config(self) -> AppConfig {
        AppConfig {
            bind: self.bind,
            database: self.database,
            catalog: self.catalog,
            in_memory: self.memory,
            lifecycle: LifecycleConfig {
                duplicate_complete_window_secs: self.duplicate_window_secs,
            },
            ..AppConfig::default()
        }
    }
}

#[derive(Debug, Args)]
struct SeedArgs {
    #[arg(long, env = "GYMLOG_DATABASE", default_value = "gymlog.db")]
    database: PathBuf,
    #[arg(long, default_value = "test@example.com")]
    user: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args.into_config()).await,
        Command::Seed(args) => seed(args),
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let catalog = Arc::new(ExerciseCatalog::load_or_empty(config.catalog.as_deref()));

    let handle = if config.in_memory {
        info!("using in-memory store");
        let manager = LifecycleManager::with_clock(MemoryGateway::new(), SystemClock, config.lifecycle.clone());
        spawn_gymlog(manager, config.runtime.clone())
    } else {
        let gateway = SqliteGateway::open(&config.database)
            .with_context(|| format!("open database {}", config.database.display()))?;
        info!(database = %config.database.display(), "database opened");
        let manager = LifecycleManager::with_clock(gateway, SystemClock, config.lifecycle.clone());
        spawn_gymlog(manager, config.runtime.clone())
    };
    log_events(&handle);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    info!(addr = %listener.local_addr()?, "listening");

    let state = AppState {
        handle: handle.clone(),
        catalog,
    };
    http::serve(listener, state, shutdown_signal())
        .await
        .context("http server")?;

    handle.shutdown().await.context("stop runtime")?;
    info!("shutdown complete");
    Ok(())
}

fn seed(args: SeedArgs) -> Result<()> {
    let gateway = SqliteGateway::open(&args.database)
        .with_context(|| format!("open database {}", args.database.display()))?;
    let mut manager = LifecycleManager::new(gateway);

    let workout = manager.create_workout(
        &args.user,
        "Chest & Triceps Day",
        Some("Focus on form and controlled movements".to_string()),
    )?;
    let bench = manager.add_exercise(workout.id, "Bench Press")?;
    manager.add_set(bench.id, 10, Some(60.0), None)?;
    manager.add_set(bench.id, 8, Some(70.0), None)?;

    info!(workout_id = workout.id, user = %args.user, "sample workout seeded");
    Ok(())
}

fn log_events(handle: &WorkoutHandle) {
    let mut events = handle.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(?event, "workout event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
