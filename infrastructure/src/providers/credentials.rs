//! API key resolution for provider adapters

use crate::config::{KeyPolicy, ProviderSettings};
use superai_application::Credential;
use superai_domain::ProviderError;

/// Picks the key an adapter sends upstream
///
/// A key supplied with the request wins over the server key when the
/// policy allows both.
#[derive(Clone)]
pub struct CredentialResolver {
    policy: KeyPolicy,
    server_key: Option<Credential>,
    prefix: Option<String>,
    provider: String,
}

impl CredentialResolver {
    pub fn new(
        provider: impl Into<String>,
        policy: KeyPolicy,
        server_key: Option<Credential>,
        prefix: Option<String>,
    ) -> Self {
        Self {
            policy,
            server_key,
            prefix,
            provider: provider.into(),
        }
    }

    /// Build from resolved settings, reading the server key from the
    /// inline value or the configured environment variable
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let server_key = settings
            .api_key
            .clone()
            .and_then(Credential::new)
            .or_else(|| {
                settings
                    .api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
                    .and_then(Credential::new)
            });
        Self::new(
            settings.id.display_name(),
            settings.key_policy,
            server_key,
            settings.key_prefix.clone(),
        )
    }

    pub fn has_server_key(&self) -> bool {
        self.server_key.is_some()
    }

    pub fn resolve(&self, request: Option<&Credential>) -> Result<Credential, ProviderError> {
        let chosen = match self.policy {
            KeyPolicy::Server => self.server_key.as_ref(),
            KeyPolicy::Request => request,
            KeyPolicy::Either => request.or(self.server_key.as_ref()),
        };

        let Some(key) = chosen else {
            return Err(ProviderError::auth(match self.policy {
                KeyPolicy::Request => "API key is required".to_string(),
                _ => format!("{} API key not configured", self.provider),
            }));
        };

        if let Some(prefix) = &self.prefix
            && !key.expose().starts_with(prefix.as_str())
        {
            return Err(ProviderError::validation(format!(
                "Invalid {} API key format",
                self.provider
            )));
        }

        Ok(key.clone())
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("provider", &self.provider)
            .field("policy", &self.policy)
            .field("server_key", &self.server_key.is_some())
            .field("prefix", &self.prefix)
            .finish()
    }
}
