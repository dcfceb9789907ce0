use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use spam_detector::classifier::{HybridClassifier, ModelArtifacts};
use spam_detector::cli::run_repl;
use spam_detector::config::DetectorConfig;
use spam_detector::server::{AppState, app_routes, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DetectorConfig::from_env().context("reading SPAM_DETECTOR_* configuration")?;

    // Initialize tracing; keep the file guard alive for the whole run
    let (file_layer, _log_guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "spam-detector.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    eprintln!("📧 Spam Detector v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Models: {}", config.model_dir.display());

    // ── Model artifacts (startup precondition) ─────────────────────────
    let artifacts = ModelArtifacts::load(&config.model_dir).unwrap_or_else(|e| {
        eprintln!("Error: failed to load model artifacts: {}", e);
        eprintln!("  export SPAM_DETECTOR_MODEL_DIR=/path/to/models");
        std::process::exit(1);
    });
    eprintln!("   Features: {}", artifacts.n_features());

    let classifier = Arc::new(HybridClassifier::new(artifacts));
    let state = AppState::new(classifier, &config);
    let app = app_routes(state.clone());
    let addr = config.listen_addr();

    eprintln!("   Classify API: http://{}/classify", addr);
    eprintln!("   Chat API: http://{}/api/chat", addr);
    eprintln!("   Chat WS: ws://{}/ws/chat", addr);
    if let Some(ref dir) = config.log_dir {
        eprintln!("   Logs: {}", dir.display());
    }
    eprintln!();

    if !config.cli_enabled {
        serve(&addr, app).await?;
        return Ok(());
    }

    let server = tokio::spawn(async move { serve(&addr, app).await });

    run_repl(state).await?;

    // REPL exited; if the server already died, report why.
    if server.is_finished() {
        server.await??;
    } else {
        server.abort();
    }
    Ok(())
}
