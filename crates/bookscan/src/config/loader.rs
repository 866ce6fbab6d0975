use std::path::Path;

use crate::config::schema::AppConfig;
use crate::error::ConfigError;

/// Env var naming the JSON config file for the scanner service.
pub const CONFIG_PATH_ENV: &str = "BOOKSCAN_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads the file named by `BOOKSCAN_CONFIG`, or returns defaults when unset.
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => load_config(path.trim()),
        _ => Ok(AppConfig::default()),
    }
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.page_size == 0 || config.page_size > 1000 {
        return Err(ConfigError::Validation {
            message: format!("page_size must be in 1..=1000, got {}", config.page_size),
        });
    }

    if config.log_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "log_capacity must be greater than zero".to_string(),
        });
    }

    if config.history_limit == 0 {
        return Err(ConfigError::Validation {
            message: "history_limit must be greater than zero".to_string(),
        });
    }

    if config.stream_poll_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "stream_poll_interval_ms must be greater than zero".to_string(),
        });
    }

    if config.thumbnail_folder.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "thumbnail_folder may not be empty".to_string(),
        });
    }

    if config.output_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "output_file may not be empty".to_string(),
        });
    }

    Ok(())
}
