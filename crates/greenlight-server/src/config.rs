use std::{fmt::Display, path::PathBuf, time::Duration};

use crate::error::Result;
pub use clap::Parser;
use greenlight_app::state::AppConfig;
use greenlight_dal::PoolSettings;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "JSON API server for movie records")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 4000,
        env = "GREENLIGHT_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,

    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "GREENLIGHT_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        short,
        long,
        value_enum,
        default_value_t = Environment::Development,
        env = "GREENLIGHT_ENV",
        help = "Deployment environment, reported by healthcheck"
    )]
    pub env: Environment,

    #[arg(
        long,
        env = "GREENLIGHT_BASE_URL",
        default_value = "http://localhost:4000",
        help = "Base URL of the server, as visible to clients"
    )]
    pub base_url: Url,

    #[arg(
        long,
        env = "GREENLIGHT_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/greenlight.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "GREENLIGHT_DATA_DIR",
        help = "Data directory, default is system default like ~/.local/share/greenlight",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "GREENLIGHT_DB_MAX_OPEN_CONNS",
        default_value_t = 25,
        help = "Maximum number of open database connections"
    )]
    pub db_max_open_conns: u32,

    #[arg(
        long,
        env = "GREENLIGHT_DB_MAX_IDLE_TIME",
        default_value = "15m",
        help = "Close database connections idle for longer than this (e.g. 15m, 1h)",
        value_parser = humantime::parse_duration
    )]
    pub db_max_idle_time: Duration,

    #[arg(
        long,
        env = "GREENLIGHT_QUERY_TIMEOUT",
        default_value = "3s",
        help = "Time limit for a single database operation",
        value_parser = humantime::parse_duration
    )]
    pub query_timeout: Duration,

    #[arg(
        long,
        env = "GREENLIGHT_DEFAULT_PAGE_SIZE",
        default_value_t = 20,
        help = "Page size used when a listing does not specify one"
    )]
    pub default_page_size: i64,

    #[arg(long, env = "GREENLIGHT_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("greenlight"))
        .unwrap_or_else(|| PathBuf::from("greenlight"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/greenlight.db", self.data_dir))
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.db_max_open_conns,
            idle_timeout: Some(self.db_max_idle_time),
            ..Default::default()
        }
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            env: config.env.to_string(),
            query_timeout: config.query_timeout,
            default_page_size: config.default_page_size,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["greenlight", "--data-dir", "/tmp/gl"]).unwrap();
        assert_eq!(4000, config.port);
        assert_eq!(Environment::Development, config.env);
        assert_eq!("sqlite:///tmp/gl/greenlight.db", config.database_url());
        assert_eq!(Duration::from_secs(15 * 60), config.db_max_idle_time);
        assert_eq!(25, config.pool_settings().max_connections);
        assert!(!config.no_cors);

        let app: AppConfig = (&config).into();
        assert_eq!("development", app.env);
        assert_eq!(Duration::from_secs(3), app.query_timeout);
        assert_eq!(20, app.default_page_size);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "greenlight",
            "--env",
            "production",
            "--database-url",
            "sqlite::memory:",
            "--query-timeout",
            "500ms",
            "--db-max-open-conns",
            "4",
            "--no-cors",
        ])
        .unwrap();
        assert_eq!("production", config.env.to_string());
        assert_eq!("sqlite::memory:", config.database_url());
        assert_eq!(Duration::from_millis(500), config.query_timeout);
        assert_eq!(4, config.pool_settings().max_connections);
        assert!(config.no_cors);

        assert!(ServerConfig::try_parse_from(["greenlight", "--env", "qa"]).is_err());
    }
}
