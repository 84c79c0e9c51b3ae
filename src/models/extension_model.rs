use serde::{Deserialize, Serialize};
use windcube_reader::SourceConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub connection: Connection,
    pub source: SourceConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Connection {
    pub ip: String,
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_config() {
        let config: ServerConfig = serde_json::from_str(
            r#"{
                "name": "windcube",
                "version": "0.1.0",
                "connection": { "ip": "127.0.0.1", "port": 0 },
                "source": { "root": "Database", "max_open_files": 8 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.connection.port, 0);
        assert_eq!(config.source.max_open_files, 8);
        assert_eq!(config.source.sample_period_secs, 600);
        assert!(config.description.is_empty());
    }
}
