//! vigild: runs the compliance alert engine as a standing daemon.
//!
//! Reads `vigil.toml` from the working directory (plus `VIGIL_*` overrides)
//! and obligations from the JSON file named by `VIGIL_OBLIGATIONS`.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use vigil_core::config::VigilConfig;
use vigil_core::errors::VigilResult;
use vigil_core::traits::Notifier;
use vigil_engine::{ComplianceEngine, JsonFileObligationSource, RuleCatalog};
use vigil_notify::LogNotifier;

const OBLIGATIONS_ENV: &str = "VIGIL_OBLIGATIONS";
const DEFAULT_OBLIGATIONS_FILE: &str = "obligations.json";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "vigild exited with error");
            eprintln!("vigild: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> VigilResult<()> {
    let config = VigilConfig::load(Path::new("."))?;
    vigil_core::tracing::init_tracing_with_filter(&config.observability.log_filter);

    let obligations =
        std::env::var(OBLIGATIONS_ENV).unwrap_or_else(|_| DEFAULT_OBLIGATIONS_FILE.to_string());
    let source = Arc::new(JsonFileObligationSource::new(&obligations));
    let notifiers: Vec<Arc<dyn Notifier>> = LogNotifier::all_channels()
        .into_iter()
        .map(|n| Arc::new(n) as Arc<dyn Notifier>)
        .collect();

    let engine = ComplianceEngine::open(config, source, notifiers)?;
    let seeded = engine.seed_rules(RuleCatalog::default_rules())?;
    tracing::info!(
        version = vigil_core::constants::VERSION,
        obligations = %obligations,
        default_rules_seeded = seeded,
        "vigild starting"
    );

    let worker = engine.spawn_worker();
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
    worker.shutdown().await;
    Ok(())
}
