//! Strata Runtime - configuration, logging and scope assembly.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `StrataConfig`)
//! - Logging setup on top of `tracing-subscriber` (`LoggingBuilder`)
//! - Scope tree assembly (`StrataRuntime`)
//!
//! ```ignore
//! use strata_runtime::StrataRuntime;
//!
//! let runtime = StrataRuntime::load()?;
//! let java = runtime.resolve("build", "java")?;
//! println!("{}", runtime.stats());
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LoggingConfig, RegistryConfig, ScopeConfig,
    StrataConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, RuntimeStats, Scope, StrataRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros and `Level`.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
