//! Configuration for the Strata runtime.
//!
//! Settings are layered with figment from defaults, TOML/YAML files,
//! programmatic overrides and `STRATA_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, ROOT_SCOPE, RegistryConfig, ScopeConfig,
    StrataConfig,
};
pub use validation::validate_config;
