use tokio::fs;
use std::sync::OnceLock;
use tracing::info;
use crate::models::extension_model::ServerConfig;
use tokio::net::TcpListener;

static CONFIG_CACHE: OnceLock<ServerConfig> = OnceLock::new();

pub const CONFIG_ENV: &str = "WINDCUBE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "windcube.json";

pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub async fn load_config(file_path: &str) -> Result<ServerConfig, String> {
    let data = fs::read_to_string(file_path)
        .await
        .map_err(|e| format!("File read Error: {e} {file_path}"))?;

    let config: ServerConfig = serde_json::from_str(&data)
        .map_err(|e| format!("JSON Parse Error: {e}"))?;

    config
        .source
        .validate()
        .map_err(|e| format!("Invalid source config: {e}"))?;

    Ok(config)
}

pub async fn init_config_and_bind() -> Result<TcpListener, String> {
    let file_path = config_path();
    let mut config = load_config(&file_path).await?;

    let bind_addr = format!(
        "{}:{}",
        config.connection.ip,
        config.connection.port
    );

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("Bind failed: {e}"))?;

    let actual_port = listener
        .local_addr()
        .map_err(|e| format!("Addr error: {e}"))?
        .port();

    // Port 0 in the config asks the OS for a free port
    config.connection.port = actual_port;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| "Config already initialized".to_string())?;

    info!("Config loaded from {} with port {}", file_path, actual_port);

    Ok(listener)
}

pub fn get_cached_config() -> Option<&'static ServerConfig> {
    CONFIG_CACHE.get()
}
