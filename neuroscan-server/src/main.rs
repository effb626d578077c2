//! neuroscan-server - MRI upload analysis service
//!
//! Accepts uploaded brain scans, gates them through an MRI-plausibility
//! heuristic, forwards plausible scans to the external tumor classifier,
//! and serves the analysis history.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use neuroscan_common::config::{ConfigOverrides, ServiceConfig};
use neuroscan_common::db::{init_database, HistoryStore};
use neuroscan_common::disease::DiseaseCatalog;
use neuroscan_server::analysis::AnalysisPipeline;
use neuroscan_server::services::HttpClassifier;
use neuroscan_server::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "neuroscan-server", about = "MRI upload analysis service")]
struct Cli {
    /// Root folder holding the database and staged uploads
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP bind address (host:port)
    #[arg(long)]
    bind: Option<String>,

    /// Inference endpoint of the tumor classifier
    #[arg(long)]
    classifier_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting neuroscan-server v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = ServiceConfig::resolve(ConfigOverrides {
        root_folder: cli.root_folder,
        bind_address: cli.bind,
        classifier_url: cli.classifier_url,
    })?;
    config.ensure_directories()?;

    info!("Root folder: {}", config.root_folder.display());
    info!("Upload directory: {}", config.upload_dir.display());
    info!("Classifier endpoint: {}", config.classifier_url);

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let pool = init_database(&db_path).await?;
    let store = HistoryStore::new(pool);

    let classifier = Arc::new(HttpClassifier::new(config.classifier_url.clone())?);
    let pipeline = Arc::new(AnalysisPipeline::new(
        config.clone(),
        classifier,
        DiseaseCatalog::builtin(),
        store.clone(),
    ));

    let state = AppState::new(pipeline, store, config.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
