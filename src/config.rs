//! Application-level configuration loading: event limits, image sizes, upload location and cache lifetime.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "JAM_EVENTS_BACK_CONFIG_PATH";

const DEFAULT_MAX_CATEGORY_COUNT: usize = 6;
const DEFAULT_LOGO_MAX_DIAGONAL: u32 = 1000;
const DEFAULT_BANNER_MAX_DIAGONAL: u32 = 3000;
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Maximum number of rating categories an event may declare.
    pub max_category_count: usize,
    /// Maximum diagonal, in pixels, of an event logo.
    pub logo_max_diagonal: u32,
    /// Maximum diagonal, in pixels, of an event banner.
    pub banner_max_diagonal: u32,
    /// Directory where uploaded pictures are stored.
    pub uploads_dir: PathBuf,
    /// Lifetime of cached event lookups.
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        max_category_count = app_config.max_category_count,
                        uploads_dir = %app_config.uploads_dir.display(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// Missing keys keep their default.
struct RawConfig {
    max_category_count: Option<usize>,
    logo_max_diagonal: Option<u32>,
    banner_max_diagonal: Option<u32>,
    uploads_dir: Option<PathBuf>,
    cache_ttl_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            max_category_count: value
                .max_category_count
                .unwrap_or(DEFAULT_MAX_CATEGORY_COUNT),
            logo_max_diagonal: value.logo_max_diagonal.unwrap_or(DEFAULT_LOGO_MAX_DIAGONAL),
            banner_max_diagonal: value
                .banner_max_diagonal
                .unwrap_or(DEFAULT_BANNER_MAX_DIAGONAL),
            uploads_dir: value
                .uploads_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR)),
            cache_ttl: Duration::from_secs(value.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "max_category_count": 3, "cache_ttl_secs": 10 }"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.max_category_count, 3);
        assert_eq!(config.cache_ttl, Duration::from_secs(10));
        assert_eq!(config.logo_max_diagonal, 1000);
        assert_eq!(config.banner_max_diagonal, 3000);
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
    }
}
