//! Infrastructure layer for superai
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: HTTP provider adapters, the JSONL history
//! store, and configuration file loading.

pub mod config;
pub mod history;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, FileConfig, KeyPolicy, ProviderKind, ProviderSettings,
    Severity,
};
pub use history::JsonlHistoryStore;
pub use providers::ProviderFactory;
pub use providers::credentials::CredentialResolver;
