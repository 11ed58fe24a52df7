use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{Inputs, EXIT_OK};
use crate::publish::FilePublisher;
use crate::reload::{self, ReloadGate, Reloader};

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub inputs: Inputs,
    /// Published document the engine reads
    #[arg(short = 'o', long = "out", env = "XR_OUT")]
    pub out: PathBuf,
    /// Periodic recompile in seconds (0 disables)
    #[arg(long = "interval-secs", env = "XR_INTERVAL_SECS", default_value_t = 10)]
    pub interval_secs: u64,
}

/// Runs until Ctrl-C. The template is read once at startup.
pub async fn run(args: WatchArgs) -> Result<i32> {
    let passthrough = args.inputs.passthrough()?;
    let publisher = FilePublisher::new(&args.out);
    let applied = publisher.load_current().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "applied document unreadable; will republish");
        None
    });
    let reloader =
        Reloader::new(args.inputs.store(), passthrough, publisher).with_applied(applied);

    let gate = Arc::new(ReloadGate::new());
    let _watcher = reload::watch_file(&args.inputs.inbounds, gate.clone())?;
    let ticker = (args.interval_secs > 0)
        .then(|| reload::spawn_interval(gate.clone(), Duration::from_secs(args.interval_secs)));

    gate.trigger();
    info!(
        inbounds = %args.inputs.inbounds.display(),
        out = %args.out.display(),
        interval_secs = args.interval_secs,
        "watch started"
    );
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler failed");
        }
        info!("shutdown requested");
    };
    reload::run(gate, reloader, shutdown).await;

    if let Some(t) = ticker {
        t.abort();
    }
    Ok(EXIT_OK)
}
