//! Provider identifier value object

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// External LLM providers a prompt can be dispatched to (Value Object)
///
/// Each variant identifies one provider adapter. Unknown names are kept as
/// [`ProviderId::Custom`] so configuration can add OpenAI-compatible endpoints
/// without a code change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    /// OpenAI chat models
    Gpt,
    /// Anthropic Claude
    Claude,
    /// Google Gemini
    Gemini,
    /// DeepSeek R1 (reasoning model, emits `<think>` blocks)
    DeepSeek,
    /// Meta Llama via OpenRouter
    Llama,
    /// Mistral Devstral via OpenRouter
    Devstral,
    /// Any other configured provider
    Custom(String),
}

impl ProviderId {
    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &str {
        match self {
            ProviderId::Gpt => "gpt",
            ProviderId::Claude => "claude",
            ProviderId::Gemini => "gemini",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::Llama => "llama",
            ProviderId::Devstral => "devstral",
            ProviderId::Custom(s) => s,
        }
    }

    /// Human-facing name, used for provider cards and history records
    pub fn display_name(&self) -> &str {
        match self {
            ProviderId::Gpt => "GPT",
            ProviderId::Claude => "Claude",
            ProviderId::Gemini => "Gemini",
            ProviderId::DeepSeek => "DeepSeek",
            ProviderId::Llama => "Llama",
            ProviderId::Devstral => "Devstral",
            ProviderId::Custom(s) => s,
        }
    }

    /// Every built-in provider, in default dispatch order
    pub fn builtin() -> Vec<ProviderId> {
        vec![
            ProviderId::Gpt,
            ProviderId::Claude,
            ProviderId::Gemini,
            ProviderId::DeepSeek,
            ProviderId::Llama,
            ProviderId::Devstral,
        ]
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ProviderId::Custom(_))
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "gpt" | "openai" | "chatgpt" => ProviderId::Gpt,
            "claude" | "anthropic" => ProviderId::Claude,
            "gemini" | "google" => ProviderId::Gemini,
            "deepseek" => ProviderId::DeepSeek,
            "llama" => ProviderId::Llama,
            "devstral" => ProviderId::Devstral,
            _ => ProviderId::Custom(normalized),
        })
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

impl Serialize for ProviderId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ProviderId::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_roundtrip() {
        for provider in ProviderId::builtin() {
            let parsed: ProviderId = provider.to_string().parse().unwrap();
            assert_eq!(provider, parsed);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(ProviderId::from("OpenAI"), ProviderId::Gpt);
        assert_eq!(ProviderId::from("anthropic"), ProviderId::Claude);
        assert_eq!(ProviderId::from(" Google "), ProviderId::Gemini);
    }

    #[test]
    fn test_custom_provider() {
        let provider = ProviderId::from("Mixtral");
        assert_eq!(provider, ProviderId::Custom("mixtral".to_string()));
        assert!(provider.is_custom());
        assert_eq!(provider.display_name(), "mixtral");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ProviderId::DeepSeek).unwrap();
        assert_eq!(json, "\"deepseek\"");
        let back: ProviderId = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(back, ProviderId::Gemini);
    }
}
