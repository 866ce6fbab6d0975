//! Credential resolution for scan runs.
//!
//! A credential can come from three places, checked in order:
//!
//! 1. **Direct value** - sent in the start request body
//! 2. **File reference** - e.g. a mounted service-account key at `/run/secrets/drive.json`
//! 3. **Env var** - e.g. `GOOGLE_SERVICE_ACCOUNT_JSON`

use secrecy::SecretString;
use std::fs;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided for {name}")]
    NoSourceProvided { name: &'static str },

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where a single credential may be found. Empty strings count as absent.
#[derive(Debug, Clone, Copy)]
pub struct SecretSource<'a> {
    pub name: &'static str,
    pub direct: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

/// Resolves a secret from its sources in priority order.
///
/// A missing env var is not an error on its own; it only becomes
/// [`SecretError::NoSourceProvided`] when no earlier source produced a value.
/// A configured file that cannot be read is always an error.
pub fn resolve_secret(source: SecretSource<'_>) -> Result<SecretString> {
    if let Some(value) = source.direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = source.file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return match fs::read_to_string(&expanded) {
            Ok(content) => Ok(SecretString::from(content.trim().to_string())),
            Err(e) => Err(SecretError::FileReadError {
                path: expanded,
                source: e,
            }),
        };
    }

    if let Some(var_name) = source.env_var.filter(|v| !v.is_empty()) {
        match std::env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => {
                return Ok(SecretString::from(value.trim().to_string()));
            }
            Ok(_) | Err(std::env::VarError::NotPresent) => {}
            Err(std::env::VarError::NotUnicode(_)) => {
                return Err(SecretError::EnvVarNotUnicode {
                    name: var_name.to_string(),
                })
            }
        }
    }

    Err(SecretError::NoSourceProvided { name: source.name })
}

/// Expands `~` and `~/path` to the current user's home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
