//! History configuration from TOML (`[history]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    pub enabled: bool,
    /// JSONL file; defaults to `$XDG_DATA_HOME/superai/history.jsonl`
    pub path: Option<PathBuf>,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl FileHistoryConfig {
    /// Resolved history file location, if one can be determined
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("superai").join("history.jsonl")))
    }
}
