//! Alertmanager configuration controller.
//!
//! # Architecture Overview
//!
//! ```text
//!   bundles_dir ──▶ source (watch + diff) ──▶ BundleEvent channel
//!                                                  │
//!                                                  ▼
//!                                            reconciler
//!                       ┌──────────────────────────┼───────────────────────┐
//!                       ▼                          ▼                       ▼
//!                 store (active)            backlog (quarantine)      assembler
//!                       └──────────────┬───────────┘                       │
//!                                      ▼                                   ▼
//!                               config_path/*                 alertmanager.yml ──▶ reload
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use alertmanager_config_controller::assembler::{AlertmanagerValidator, Assembler};
use alertmanager_config_controller::config::loader::{finalize, read_config};
use alertmanager_config_controller::config::{ControllerConfig, LogFormat};
use alertmanager_config_controller::lifecycle::signals::wait_for_termination;
use alertmanager_config_controller::lifecycle::Shutdown;
use alertmanager_config_controller::observability::{logging, metrics};
use alertmanager_config_controller::reload::ReloadClient;
use alertmanager_config_controller::source::BundleWatcher;
use alertmanager_config_controller::store::StoreSet;
use alertmanager_config_controller::Reconciler;

#[derive(Parser, Debug)]
#[command(name = "alertmanager-config-controller")]
#[command(about = "Assembles alertmanager.yml from route, receiver and inhibit-rule bundles", long_about = None)]
struct Args {
    /// TOML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding fragment stores and the generated alertmanager.yml
    #[arg(long)]
    config_path: Option<PathBuf>,

    /// Path of the alertmanager.yml template
    #[arg(long = "config-template")]
    template_path: Option<PathBuf>,

    /// Instance id bundles must carry
    #[arg(long)]
    id: Option<i64>,

    /// Access key for base-config bundles
    #[arg(long)]
    key: Option<String>,

    /// Alertmanager reload endpoint
    #[arg(long)]
    reload_url: Option<String>,

    /// Address for the metrics endpoint
    #[arg(long)]
    listen_address: Option<String>,

    /// Directory of bundle manifests to watch
    #[arg(long)]
    bundles_dir: Option<PathBuf>,

    /// Namespace to watch; empty watches all
    #[arg(long)]
    namespace: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn apply(self, config: &mut ControllerConfig) {
        if let Some(path) = self.config_path {
            config.instance.config_path = path;
        }
        if let Some(path) = self.template_path {
            config.instance.template_path = path;
        }
        if let Some(id) = self.id {
            config.instance.id = id;
        }
        if let Some(key) = self.key {
            config.instance.key = key;
        }
        if let Some(url) = self.reload_url {
            config.reload.url = url;
        }
        if let Some(address) = self.listen_address {
            config.observability.metrics_address = address;
        }
        if let Some(dir) = self.bundles_dir {
            config.source.bundles_dir = dir;
        }
        if let Some(namespace) = self.namespace {
            config.source.namespace = Some(namespace);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ControllerConfig::default(),
    };
    args.apply(&mut config);
    let config = finalize(config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(
        id = config.instance.id,
        config_path = %config.instance.config_path.display(),
        template = %config.instance.template_path.display(),
        reload_url = %config.reload.url,
        namespace = config.source.namespace().unwrap_or("*"),
        "alertmanager-config-controller v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        let addr: std::net::SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Arc::new(Shutdown::new());
    let identity = config.instance.clone();
    let stores = StoreSet::on_disk(&identity);
    let assembler = Assembler::new(&identity, Arc::new(AlertmanagerValidator));
    let reloader = ReloadClient::new(&config.reload, shutdown.subscribe())?;
    let mut reconciler = Reconciler::new(identity, stores, assembler, reloader);

    let (watcher, mut events) = BundleWatcher::new(&config.source);
    let watcher_task = tokio::spawn(watcher.run(shutdown.subscribe()));

    let signal_task = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            wait_for_termination().await;
            shutdown.trigger();
        })
    };

    let mut stop = shutdown.subscribe();
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let bundle = event.bundle();
                let outcome = reconciler.handle(&event).await;
                tracing::debug!(
                    namespace = %bundle.namespace,
                    name = %bundle.name,
                    ?outcome,
                    "Bundle event processed"
                );
            }
            _ = stop.triggered() => break,
        }
    }

    tracing::info!("Shutting down");
    shutdown.trigger();
    signal_task.abort();
    watcher_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
