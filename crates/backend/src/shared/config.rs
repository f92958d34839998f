use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Upper bound for waiting on a pooled connection
    #[serde(default = "default_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Upper bound for waiting on a SQLite write lock
    #[serde(default = "default_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FrontendConfig {
    /// Origin of the consumer-facing app; trace URLs and CORS are derived from it
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "target/logs".to_string(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    5
}

/// Default configuration embedded in the binary
pub(crate) const DEFAULT_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8000

[database]
path = "target/db/puretrace.db"
max_connections = 5
acquire_timeout_secs = 5
busy_timeout_secs = 5

[frontend]
base_url = "http://localhost:5173"

[logging]
dir = "target/logs"
"#;

/// Something worth logging about how the configuration was resolved.
///
/// Configuration is loaded before the tracing subscriber exists, so notices
/// are collected and logged by the caller afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNotice {
    Info(String),
    Warn(String),
}

impl ConfigNotice {
    pub fn log(&self) {
        match self {
            ConfigNotice::Info(message) => tracing::info!("{}", message),
            ConfigNotice::Warn(message) => tracing::warn!("{}", message),
        }
    }
}

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// `DATABASE_PATH` and `FRONTEND_BASE_URL` override the file in both cases.
pub fn load_config() -> anyhow::Result<(Config, Vec<ConfigNotice>)> {
    let mut notices = Vec::new();
    let mut config = match find_config_file(&mut notices) {
        Some(config_path) => {
            notices.push(ConfigNotice::Info(format!(
                "Loading config from: {}",
                config_path.display()
            )));
            let contents = std::fs::read_to_string(&config_path)?;
            parse_config(&contents)?
        }
        None => {
            notices.push(ConfigNotice::Info(
                "Using default embedded configuration".to_string(),
            ));
            parse_config(DEFAULT_CONFIG)?
        }
    };

    notices.extend(apply_env_overrides(&mut config, |key| std::env::var(key).ok()));
    Ok((config, notices))
}

fn find_config_file(notices: &mut Vec<ConfigNotice>) -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let config_path = exe_path.parent()?.join("config.toml");
    if config_path.exists() {
        Some(config_path)
    } else {
        notices.push(ConfigNotice::Warn(format!(
            "config.toml not found at: {}",
            config_path.display()
        )));
        None
    }
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str(contents)?)
}

fn apply_env_overrides(
    config: &mut Config,
    var: impl Fn(&str) -> Option<String>,
) -> Vec<ConfigNotice> {
    let mut notices = Vec::new();
    if let Some(path) = var("DATABASE_PATH").filter(|v| !v.is_empty()) {
        notices.push(ConfigNotice::Info(format!(
            "DATABASE_PATH overrides database.path: {}",
            path
        )));
        config.database.path = path;
    }
    if let Some(url) = var("FRONTEND_BASE_URL").filter(|v| !v.is_empty()) {
        notices.push(ConfigNotice::Info(format!(
            "FRONTEND_BASE_URL overrides frontend.base_url: {}",
            url
        )));
        config.frontend.base_url = url;
    }
    notices
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> PathBuf {
    let db_path = Path::new(&config.database.path);

    if db_path.is_absolute() {
        return db_path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(db_path);
        }
    }

    PathBuf::from(&config.database.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/puretrace.db");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.frontend.base_url, "http://localhost:5173");
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_optional_sections_default() {
        let config = parse_config(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            path = "/var/lib/puretrace/app.db"

            [frontend]
            base_url = "https://trace.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.acquire_timeout_secs, 5);
        assert_eq!(config.logging.dir, "target/logs");
        assert_eq!(
            get_database_path(&config),
            PathBuf::from("/var/lib/puretrace/app.db")
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = parse_config(DEFAULT_CONFIG).unwrap();
        let env: HashMap<&str, &str> = [
            ("DATABASE_PATH", "/tmp/trace.db"),
            ("FRONTEND_BASE_URL", ""),
        ]
        .into_iter()
        .collect();

        let notices = apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.path, "/tmp/trace.db");
        assert_eq!(config.frontend.base_url, "http://localhost:5173");
        assert_eq!(
            notices,
            vec![ConfigNotice::Info(
                "DATABASE_PATH overrides database.path: /tmp/trace.db".to_string()
            )]
        );
    }

    #[test]
    fn test_load_config_reports_source() {
        let (_, notices) = load_config().unwrap();
        assert!(notices.iter().any(|n| matches!(
            n,
            ConfigNotice::Info(m)
                if m.starts_with("Loading config from") || m == "Using default embedded configuration"
        )));
    }
}
