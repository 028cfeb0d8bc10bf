//! Rift Mocks - API mock server
//!
//! # Usage
//!
//! ```bash
//! # Serve ./mocks on port 3100, admin API on 3110
//! rift-mocks
//!
//! # Pick a collection and a folder
//! rift-mocks --mocks ./fixtures --collection users-error
//!
//! # Everything from a YAML file, flags win over the file
//! rift-mocks --config rift-mocks.yaml --delay 200
//! ```

use anyhow::Context;
use clap::Parser;
use rift_mocks::admin_api::{AdminApiServer, AdminState};
use rift_mocks::config::{Config, GlobalDelay};
use rift_mocks::files::{FileLoader, MocksWatcher};
use rift_mocks::server::MockServer;
use rift_mocks::{Alerts, Mocks};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rift-mocks")]
#[command(author, version, about = "API mock server with route variants and collections")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "RIFT_MOCKS_CONFIG")]
    config: Option<PathBuf>,

    /// Mock server port
    #[arg(short, long, env = "RIFT_MOCKS_PORT")]
    port: Option<u16>,

    /// Mock server host
    #[arg(long, env = "RIFT_MOCKS_HOST")]
    host: Option<String>,

    /// Admin API port
    #[arg(long, env = "RIFT_MOCKS_ADMIN_PORT")]
    admin_port: Option<u16>,

    /// Do not start the admin API
    #[arg(long, env = "RIFT_MOCKS_NO_ADMIN")]
    no_admin: bool,

    /// Mocks folder
    #[arg(short, long, env = "RIFT_MOCKS_PATH")]
    mocks: Option<PathBuf>,

    /// Collection selected on startup
    #[arg(long, env = "RIFT_MOCKS_COLLECTION")]
    collection: Option<String>,

    /// Global response delay in milliseconds
    #[arg(long, env = "RIFT_MOCKS_DELAY")]
    delay: Option<i64>,

    /// Do not reload when files change
    #[arg(long, env = "RIFT_MOCKS_NO_WATCH")]
    no_watch: bool,

    /// Log filter when RUST_LOG is not set
    #[arg(long, default_value = "info", env = "RIFT_MOCKS_LOG_LEVEL")]
    log_level: String,
}

impl Args {
    /// Configuration file (or defaults) overlaid with command line flags.
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.admin.host = host.clone();
            config.server.host = host;
        }
        if let Some(port) = self.admin_port {
            config.admin.port = port;
        }
        if self.no_admin {
            config.admin.enabled = false;
        }
        if let Some(path) = self.mocks {
            config.mocks.path = path;
        }
        if let Some(collection) = self.collection {
            config.mocks.collection = Some(collection);
        }
        if let Some(delay) = self.delay {
            config.mocks.delay = delay;
        }
        if self.no_watch {
            config.mocks.watch = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn socket_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = args.into_config()?;
    info!("rift-mocks v{} starting", env!("CARGO_PKG_VERSION"));

    let alerts = Arc::new(Alerts::new());
    let delay = GlobalDelay::new(config.mocks.delay);

    let mut mocks = Mocks::new(Arc::new(alerts.scoped("mocks")), delay.provider());
    if let Some(collection) = &config.mocks.collection {
        mocks = mocks.with_selected(collection.clone());
    }
    let mocks = Arc::new(mocks);

    let loader = Arc::new(FileLoader::new(
        config.mocks.path.clone(),
        Arc::new(alerts.scoped("files")),
    ));
    // Serve whatever could be loaded; problems are reported as alerts
    if let Err(e) = loader.reload(&mocks) {
        error!("Failed to load mocks: {}. Starting with no routes.", e);
    }

    let _watcher = if config.mocks.watch {
        let watcher = MocksWatcher::new(
            Arc::clone(&loader),
            Arc::clone(&mocks),
            Duration::from_millis(config.mocks.watch_debounce_ms),
        );
        match watcher.run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Not watching {}: {}", loader.root().display(), e);
                None
            }
        }
    } else {
        None
    };

    if config.admin.enabled {
        let addr = socket_addr(&config.admin.host, config.admin.port)?;
        let state = AdminState::new(Arc::clone(&mocks), Arc::clone(&alerts), delay.clone())
            .with_loader(Arc::clone(&loader));
        tokio::spawn(async move {
            if let Err(e) = AdminApiServer::new(addr, state).run().await {
                error!("Admin API stopped: {}", e);
            }
        });
    }

    let addr = socket_addr(&config.server.host, config.server.port)?;
    tokio::select! {
        result = MockServer::new(addr, Arc::clone(&mocks)).run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
