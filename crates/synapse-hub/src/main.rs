//! Synapse Hub Server

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use synapse_hub::config::Config;
use synapse_hub::http::{self, ApiState};
use synapse_hub::orchestrator::Orchestrator;
use synapse_hub::plugins::{builtin_descriptors, builtin_factories};
use synapse_hub::registry::{self, PluginRegistry};
use synapse_hub::store::MemoryTaskStore;
use synapse_hub::watchdog::Watchdog;

/// Synapse automation hub.
#[derive(Debug, Parser)]
#[command(name = "synapse-hub", version, about)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Directory scanned for `<plugin>/plugin.json` manifests, merged
    /// after the built-in plugin table.
    #[arg(long)]
    plugin_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    // Load config
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Falling back to default configuration");
            Config::default()
        }
    };

    // Built-in plugins first; manifest-discovered descriptors after, so
    // the first-registration-wins rule favors the compiled-in table.
    let mut descriptors = builtin_descriptors();
    if let Some(dir) = &args.plugin_dir {
        descriptors.extend(registry::load_manifests(dir));
    }

    let factories = builtin_factories();
    let registry = Arc::new(PluginRegistry::load(descriptors, &factories, &config).await);
    let store = Arc::new(MemoryTaskStore::new());
    let orchestrator = Orchestrator::new(
        registry.clone(),
        store,
        config.default_plugin.clone(),
    );

    let watchdog = Watchdog::new(
        orchestrator.clone(),
        registry.clone(),
        config.watchdog_interval_secs,
    );
    if config.features.scheduler_enabled {
        watchdog.start();
    } else {
        info!("Watchdog disabled by configuration");
    }

    let router = http::create_router(Arc::new(ApiState {
        orchestrator,
        registry: registry.clone(),
    }));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "Synapse hub listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    watchdog.stop().await;
    registry.shutdown_all().await;
    info!("Synapse hub stopped");

    Ok(())
}
