//! Turn configuration from TOML (`[aggregation]` section)

use serde::{Deserialize, Serialize};

/// Raw aggregation settings
///
/// `trigger` uses the policy string syntax (`required:deepseek,gemini`,
/// `all`, `atleast:3`). An empty `dispatch` list means every enabled
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAggregationConfig {
    pub trigger: String,
    pub dispatch: Vec<String>,
    pub provider_timeout_seconds: u64,
}

impl Default for FileAggregationConfig {
    fn default() -> Self {
        Self {
            trigger: "required:deepseek,gemini".to_string(),
            dispatch: Vec::new(),
            provider_timeout_seconds: 60,
        }
    }
}
