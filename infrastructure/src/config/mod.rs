//! Configuration file loading for superai
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SUPERAI_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./superai.toml` or `./.superai.toml`
//! 4. Global: `$XDG_CONFIG_HOME/superai/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigError, ConfigIssue, ConfigIssueCode, FileAggregationConfig, FileConfig,
    FileHistoryConfig, FileProviderConfig, FileServerConfig, FileSynthesisConfig, KeyPolicy,
    ProviderKind, ProviderSettings, Severity,
};
pub use loader::ConfigLoader;
