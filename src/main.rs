use emission_watch::artifact::ArtifactSet;
use emission_watch::pipeline::InferencePipeline;
use emission_watch::state::AppState;
use emission_watch::{api, config, enrich};
use std::net::SocketAddr;
use std::sync::Arc;

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level()?);
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "emission-watch starting"
    );

    // All six artifacts or nothing
    let artifacts = match ArtifactSet::load(&config.artifact_paths()) {
        Ok(artifacts) => artifacts,
        Err(err) => {
            tracing::error!(error = %err, "Artifact loading failed, aborting startup");
            return Err(err.into());
        }
    };
    let thresholds = config.level_thresholds()?;
    tracing::info!(
        low = thresholds.low(),
        medium = thresholds.medium(),
        "Emission level thresholds"
    );
    let pipeline = InferencePipeline::new(artifacts, thresholds);

    let enrichment = config.enrichment();
    tracing::info!(strategy = ?enrichment, "Environment enrichment configured");
    let state = Arc::new(AppState::new(pipeline, enrich::create_enricher(&enrichment)));

    let app = api::router(state);
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
