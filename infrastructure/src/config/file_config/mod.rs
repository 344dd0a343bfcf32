//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! ([`TurnParams`], [`SynthesisOptions`](superai_application::SynthesisOptions))
//! and resolved [`ProviderSettings`].

mod aggregation;
mod history;
mod providers;
mod server;
mod synthesis;

pub use aggregation::FileAggregationConfig;
pub use history::FileHistoryConfig;
pub use providers::{FileProviderConfig, KeyPolicy, ProviderKind, ProviderSettings};
pub use server::FileServerConfig;
pub use synthesis::FileSynthesisConfig;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use superai_application::TurnParams;
use superai_domain::{DomainError, ProviderId, TriggerPolicy};
use thiserror::Error;

/// Errors raised while loading or converting configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid aggregation.trigger: {0}")]
    Trigger(#[source] DomainError),

    #[error("provider '{0}' needs kind, base_url and model")]
    IncompleteProvider(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The configuration cannot work as written.
    Error,
    /// The configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    InvalidTrigger,
    RequiredProviderDisabled { provider: String },
    UnknownDispatchProvider { provider: String },
    IncompleteProvider { provider: String },
    OutOfRange { field: String },
    UnreachableQuorum { needed: usize, available: usize },
}

/// A detected issue in the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// HTTP API settings
    pub server: FileServerConfig,
    /// Trigger policy, dispatch list and per-provider timeout
    pub aggregation: FileAggregationConfig,
    /// Aggregator model and its sampling/retry settings
    pub synthesis: FileSynthesisConfig,
    /// Per-provider overrides keyed by provider id
    pub providers: BTreeMap<String, FileProviderConfig>,
    /// Turn history store
    pub history: FileHistoryConfig,
}

impl FileConfig {
    /// Resolved settings for every configured provider, built-ins first
    ///
    /// Disabled providers are included; custom sections missing their
    /// endpoint are not.
    pub fn provider_settings(&self) -> Vec<ProviderSettings> {
        let empty = FileProviderConfig::default();
        let mut settings: Vec<ProviderSettings> = ProviderId::builtin()
            .iter()
            .filter_map(|id| {
                let section = self.section(id).unwrap_or(&empty);
                section.resolve(id)
            })
            .collect();

        for (key, section) in &self.providers {
            let id = ProviderId::from(key.as_str());
            if id.is_custom()
                && let Some(resolved) = section.resolve(&id)
            {
                settings.push(resolved);
            }
        }
        settings
    }

    /// Enabled providers only, in dispatch order
    pub fn enabled_providers(&self) -> Vec<ProviderSettings> {
        self.provider_settings()
            .into_iter()
            .filter(|s| s.enabled)
            .collect()
    }

    fn section(&self, id: &ProviderId) -> Option<&FileProviderConfig> {
        self.providers
            .iter()
            .find(|(key, _)| ProviderId::from(key.as_str()) == *id)
            .map(|(_, section)| section)
    }

    pub fn trigger_policy(&self) -> Result<TriggerPolicy, ConfigError> {
        self.aggregation
            .trigger
            .parse()
            .map_err(ConfigError::Trigger)
    }

    /// Application-level turn parameters
    pub fn turn_params(&self) -> Result<TurnParams, ConfigError> {
        let dispatch = self
            .aggregation
            .dispatch
            .iter()
            .map(|p| ProviderId::from(p.as_str()))
            .collect();
        Ok(TurnParams::default()
            .with_policy(self.trigger_policy()?)
            .with_provider_timeout(Duration::from_secs(
                self.aggregation.provider_timeout_seconds,
            ))
            .with_dispatch(dispatch))
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let enabled: Vec<ProviderId> = self
            .enabled_providers()
            .into_iter()
            .map(|s| s.id)
            .collect();

        // 1. Custom sections without an endpoint
        for (key, section) in &self.providers {
            let id = ProviderId::from(key.as_str());
            if id.is_custom() && section.resolve(&id).is_none() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::IncompleteProvider {
                        provider: key.clone(),
                    },
                    format!("providers.{}: kind, base_url and model are required", key),
                ));
            }
        }

        // 2. Dispatch list must name enabled providers
        for name in &self.aggregation.dispatch {
            let id = ProviderId::from(name.as_str());
            if !enabled.contains(&id) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownDispatchProvider {
                        provider: name.clone(),
                    },
                    format!(
                        "aggregation.dispatch: '{}' is not an enabled provider",
                        name
                    ),
                ));
            }
        }

        // 3. Trigger policy must parse and be satisfiable
        let dispatched: Vec<ProviderId> = if self.aggregation.dispatch.is_empty() {
            enabled.clone()
        } else {
            self.aggregation
                .dispatch
                .iter()
                .map(|p| ProviderId::from(p.as_str()))
                .filter(|id| enabled.contains(id))
                .collect()
        };
        match self.trigger_policy() {
            Err(e) => issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidTrigger,
                format!(
                    "aggregation.trigger: '{}' is not a valid policy ({})",
                    self.aggregation.trigger, e
                ),
            )),
            Ok(TriggerPolicy::Required(required)) => {
                for id in required.iter().filter(|id| !dispatched.contains(id)) {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::RequiredProviderDisabled {
                            provider: id.to_string(),
                        },
                        format!(
                            "aggregation.trigger requires '{}', which is never dispatched; \
                             every turn would fall back",
                            id
                        ),
                    ));
                }
            }
            Ok(TriggerPolicy::AtLeast(n)) if n > dispatched.len() => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnreachableQuorum {
                        needed: n,
                        available: dispatched.len(),
                    },
                    format!(
                        "aggregation.trigger needs {} successes but only {} providers are dispatched",
                        n,
                        dispatched.len()
                    ),
                ));
            }
            Ok(_) => {}
        }

        // 4. Numeric ranges
        let mut check = |field: String, ok: bool, expected: &str| {
            if !ok {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: field.clone(),
                    },
                    format!("{}: must be {}", field, expected),
                ));
            }
        };
        check(
            "aggregation.provider_timeout_seconds".to_string(),
            self.aggregation.provider_timeout_seconds > 0,
            "greater than 0",
        );
        check(
            "synthesis.timeout_seconds".to_string(),
            self.synthesis.timeout_seconds > 0,
            "greater than 0",
        );
        check(
            "synthesis.temperature".to_string(),
            (0.0..=2.0).contains(&self.synthesis.temperature),
            "between 0 and 2",
        );
        check(
            "synthesis.top_p".to_string(),
            (0.0..=1.0).contains(&self.synthesis.top_p),
            "between 0 and 1",
        );
        for settings in self.provider_settings() {
            if let Some(t) = settings.temperature {
                check(
                    format!("providers.{}.temperature", settings.id),
                    (0.0..=2.0).contains(&t),
                    "between 0 and 2",
                );
            }
            if let Some(p) = settings.top_p {
                check(
                    format!("providers.{}.top_p", settings.id),
                    (0.0..=1.0).contains(&p),
                    "between 0 and 1",
                );
            }
        }

        issues
    }

    /// True when any issue is an error
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}
