//! Configuration management for the fulltext server and loader

use serde::Deserialize;
use std::env;

const DEFAULT_RESOURCE_BASE_URL: &str = "http://data.europeana.eu/fulltext/";
const DEFAULT_IIIF_BASE_URL: &str = "https://iiif.europeana.eu/presentation/";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub fulltext: FulltextConfig,
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FulltextConfig {
    /// Prefix of every FullTextResource url
    pub resource_base_url: String,
    /// Prefix of the ids in rendered IIIF documents
    pub iiif_base_url: String,
    /// Deployment tag mixed into every ETag
    pub app_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    pub batch_base_directory: String,
    pub stop_on_save_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8084,
            },
            database: DatabaseConfig {
                url: "sqlite:./fulltext.db".to_string(),
                max_connections: 5,
            },
            fulltext: FulltextConfig {
                resource_base_url: DEFAULT_RESOURCE_BASE_URL.to_string(),
                iiif_base_url: DEFAULT_IIIF_BASE_URL.to_string(),
                app_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            loader: LoaderConfig {
                batch_base_directory: "./batch".to_string(),
                stop_on_save_error: true,
            },
        }
    }
}

impl Config {
    /// Read the configuration from the environment.
    ///
    /// Every variable is optional. Unset or unparsable values fall back to
    /// their default one at a time.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: var("SERVER_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: var("DATABASE_MAX_CONNECTIONS")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(defaults.database.max_connections),
            },
            fulltext: FulltextConfig {
                resource_base_url: var("RESOURCE_BASE_URL")
                    .unwrap_or(defaults.fulltext.resource_base_url),
                iiif_base_url: var("IIIF_BASE_URL").unwrap_or(defaults.fulltext.iiif_base_url),
                app_version: var("APP_VERSION").unwrap_or(defaults.fulltext.app_version),
            },
            loader: LoaderConfig {
                batch_base_directory: var("BATCH_BASE_DIRECTORY")
                    .unwrap_or(defaults.loader.batch_base_directory),
                stop_on_save_error: var("STOP_ON_SAVE_ERROR")
                    .and_then(|v| parse_flag(&v))
                    .unwrap_or(defaults.loader.stop_on_save_error),
            },
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fulltext.resource_base_url, "http://data.europeana.eu/fulltext/");
        assert_eq!(config.fulltext.app_version, env!("CARGO_PKG_VERSION"));
        assert!(config.loader.stop_on_save_error);
    }

    #[test]
    fn test_unset_variables_keep_the_others() {
        let config = Config::from_vars(|name| match name {
            "DATABASE_URL" => Some("sqlite:/var/lib/fulltext/prod.db".to_string()),
            "APP_VERSION" => Some("9.9.9".to_string()),
            "STOP_ON_SAVE_ERROR" => Some("false".to_string()),
            _ => None,
        });
        assert_eq!(config.database.url, "sqlite:/var/lib/fulltext/prod.db");
        assert_eq!(config.fulltext.app_version, "9.9.9");
        assert!(!config.loader.stop_on_save_error);
        assert_eq!(config.fulltext.resource_base_url, "http://data.europeana.eu/fulltext/");
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = Config::from_vars(|name| match name {
            "SERVER_PORT" => Some("http".to_string()),
            "SERVER_HOST" => Some("127.0.0.1".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 8084);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" no "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
