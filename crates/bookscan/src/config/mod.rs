pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_env, load_config_from_str};
pub use schema::{
    AppConfig, CloudinaryCredentials, ConfigSnapshot, CredentialSources, FlatLabels, ScanConfig,
    StartRequest, DEFAULT_ROOT_ALIAS, DIRECT_LABEL,
};
