use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use wordalign_core::AlignPipeline;
use wordalign_server::{ServerConfig, router};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::parse();
    let pipeline = AlignPipeline::new(
        config
            .pipeline_config()
            .context("invalid pipeline configuration")?,
    );
    info!(
        aligner = %config.aligner.display(),
        symmetrizer = %config.symmetrizer.display(),
        model = config.model,
        rel_iterations = config.rel_iterations,
        max_upload_bytes = ?config.max_upload_bytes,
        "pipeline configured"
    );

    let app = router(pipeline, config.max_upload_bytes);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %config.bind, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    Ok(())
}
