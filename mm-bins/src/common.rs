//! Common scaffolding shared by every binary: CLI flags, logging setup,
//! kill switch installation, config load, metrics server bring-up (§4.7a).

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mm_core::config::{self, ConfigHandle, ConfigOverlay, MMConfig};
use mm_core::journal::Journal;
use mm_core::metrics::Metrics;
use mm_core::resilience::KillSwitch;

/// Flags shared by the `paper` and `live` binaries.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Path to a JSON MMConfig file; falls back to defaults if absent.
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Path to the append-only execution journal.
    #[arg(long, default_value = "journal.jsonl")]
    pub journal: String,

    /// Address the Prometheus metrics endpoint binds to.
    #[arg(long, default_value = "127.0.0.1:9898")]
    pub metrics_addr: String,

    /// Log level (respects RUST_LOG if set).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub overlay: ConfigOverlay,
}

pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
    Ok(())
}

pub struct Scaffolding {
    pub config_handle: ConfigHandle,
    pub journal: Arc<Journal>,
    pub metrics: Arc<Metrics>,
    pub kill_switch: KillSwitch,
}

/// Loads config, opens the journal, constructs the metrics registry,
/// installs the kill switch, and spawns the metrics HTTP server. Common
/// to both the `paper` and `live` binaries.
pub fn bring_up(args: &CommonArgs) -> Result<Scaffolding> {
    let mut cfg: MMConfig = config::load(&args.config).context("loading config")?;
    args.overlay.apply(&mut cfg);
    cfg.validate().context("validating config after CLI overlay")?;

    let journal = Arc::new(Journal::open(&args.journal).context("opening journal")?);
    let metrics = Arc::new(Metrics::new().context("constructing metrics registry")?);

    let kill_switch = KillSwitch::new();
    kill_switch.install().context("installing kill switch")?;

    let metrics_for_server = metrics.clone();
    let addr = args.metrics_addr.clone();
    tokio::task::spawn(async move {
        if let Err(err) = metrics_for_server.serve(&addr).await {
            tracing::warn!(error = %err, "metrics server exited");
        }
    });

    Ok(Scaffolding {
        config_handle: ConfigHandle::new(cfg),
        journal,
        metrics,
        kill_switch,
    })
}
