use axum::Router;
use tracing::{info, Level};

mod routes;
mod models;
mod utils;
mod state;

use crate::utils::conf_helper::{init_config_and_bind, get_cached_config};
use crate::state::app_state::AppState;
use windcube_reader::WindCubeSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // === CONFIG + LISTENER ===
    let listener = init_config_and_bind()
        .await
        .map_err(anyhow::Error::msg)?;

    let config = get_cached_config()
        .ok_or_else(|| anyhow::anyhow!("config not initialized"))?;

    let source = WindCubeSource::new(config.source.clone())?;
    let state = AppState::new(source);

    info!(
        "{} {} serving {} on {}:{}",
        config.name,
        config.version,
        config.source.root.display(),
        config.connection.ip,
        config.connection.port
    );

    let app = Router::new()
        .merge(routes::info_routes::health_routes())
        .merge(routes::data_routes::data_routes(state));

    axum::serve(listener, app).await?;

    Ok(())
}
