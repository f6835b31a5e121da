// MindGarden/backend/src/config.rs
use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_FRONTEND_URL_DEV: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub frontend_url_dev: String,
    pub frontend_url_prod: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(raw) => write!(f, "PORT must be a valid number, got '{}'", raw),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(AppConfig {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: lookup("DATA_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            frontend_url_dev: lookup("FRONTEND_URL_DEV")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL_DEV.to_string()),
            frontend_url_prod: lookup("FRONTEND_URL_PROD").filter(|url| !url.is_empty()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.frontend_url_dev, "http://localhost:3000");
        assert_eq!(config.frontend_url_prod, None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DATA_DIR", "/var/lib/mind-garden"),
            ("FRONTEND_URL_PROD", "https://garden.example"),
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/mind-garden"));
        assert_eq!(
            config.frontend_url_prod.as_deref(),
            Some("https://garden.example")
        );
    }

    #[test]
    fn bad_port_is_reported() {
        assert_eq!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidPort("eighty".to_string()))
        );
    }
}
