use lotcast::config::{self, Config};
use lotcast::prediction::noise::GaussianNoise;
use lotcast::prediction::{self, OccupancyModel};
use lotcast::service::{ParkingService, spawn_refresh_task};
use lotcast::sources::Providers;
use lotcast::{api, state};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::Level;

fn init_tracing(level: &str) {
    let max_level = Level::from_str(level).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(max_level.unwrap_or(Level::INFO))
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    if max_level.is_none() {
        tracing::warn!(level, "Unknown log level, using info");
    }
}

fn build_model(config: &Config) -> OccupancyModel {
    let model = match config.tables_path() {
        Some(path) => match prediction::load_tables_from_path(path)
            .and_then(OccupancyModel::new)
        {
            Ok(model) => {
                tracing::info!(path = %path.display(), "Model tables loaded");
                model
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load model tables, using defaults");
                OccupancyModel::with_defaults()
            }
        },
        None => {
            tracing::info!("No tables path configured, using default model tables");
            OccupancyModel::with_defaults()
        }
    };

    let noise = match config.noise_seed() {
        Some(seed) => GaussianNoise::from_seed(seed),
        None => GaussianNoise::from_entropy(),
    };
    model
        .with_noise(noise)
        .with_noise_std_dev(config.noise_std_dev())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = config::load_default()?;
    init_tracing(&config.logging.level);
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "lotcast starting"
    );

    let providers = Providers::from_settings(&config.source_settings())?;
    let service = Arc::new(ParkingService::new(
        build_model(&config),
        providers,
        config.search_radius_m(),
        config.utc_offset()?,
    ));

    let state = Arc::new(RwLock::new(state::AppState::new()));
    let _snapshot_rx = state
        .read()
        .map_err(|_| lotcast::error::AppError::StateLock)?
        .subscribe_snapshot();

    let refresh_interval = config.refresh_interval();
    tracing::info!(
        interval_secs = refresh_interval.as_secs(),
        "Starting campus refresh task"
    );
    let refresh_handle = spawn_refresh_task(
        Arc::clone(&service),
        Arc::clone(&state),
        config.campus_center(),
        refresh_interval,
    );

    let app = api::router(Arc::clone(&state), service);
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    refresh_handle.abort();

    Ok(())
}
