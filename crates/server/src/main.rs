mod api;
mod config;
mod external;
mod state;
mod utils;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use api::app_router;
use catalog::{
    BuildReport, Catalog, CsvStore, RecordSink, RecordSource, SnapshotStore, StoreError,
};
use config::{config_path_from_env, load_or_create_config, resolve_path, ServerConfig, StorageKind};
use external::FeatureClient;
use reqwest::Client;
use state::AppState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let boot_path = config_path.clone();
    let boot_config = config.clone();
    let (catalog, report) =
        tokio::task::spawn_blocking(move || open_catalog(&boot_path, &boot_config)).await??;
    info!(
        "Catalog ready: {} songs ({} rows rejected)",
        report.accepted, report.rejected
    );

    let external_client = Client::builder().user_agent("songbook/0.1").build()?;
    let extractor = FeatureClient::new(
        external_client,
        &config.extractor_url,
        Duration::from_secs(config.extractor_timeout_secs),
    );
    if !extractor.is_configured() {
        warn!("Feature extractor not configured; adding songs is disabled.");
    }

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let state = AppState {
        catalog: Arc::new(catalog),
        config: Arc::new(config),
        extractor,
    };
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Loads the song table from the configured storage. A missing CSV starts an
/// empty catalog; an empty snapshot is seeded from the CSV when one exists.
fn open_catalog(
    config_path: &Path,
    config: &ServerConfig,
) -> Result<(Catalog, BuildReport), StoreError> {
    let csv = CsvStore::new(resolve_path(config_path, &config.songs_csv));
    match config.storage {
        StorageKind::Csv => {
            if !csv.path().exists() {
                warn!("Songs file {:?} not found; starting empty.", csv.path());
                return Ok(Catalog::new(Vec::new(), Box::new(csv)));
            }
            Catalog::load(&csv.clone(), Box::new(csv))
        }
        StorageKind::Snapshot => {
            let snapshot_path = resolve_path(config_path, &config.snapshot_path);
            let snapshot = SnapshotStore::open(&snapshot_path)?;
            if snapshot.info()?.is_none() && csv.path().exists() {
                info!("Seeding snapshot {:?} from {:?}", snapshot_path, csv.path());
                let rows = csv.load()?;
                snapshot.persist(&rows)?;
            }
            Catalog::load(&snapshot.clone(), Box::new(snapshot))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
