use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::document::DEFAULT_UUID_PREFIX;

/// Client-side settings, stored as JSON next to the user's other config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    #[serde(alias = "uuidPrefix")]
    pub uuid_prefix: String,
    #[serde(alias = "warnUnmatchedReplies")]
    pub warn_unmatched_replies: bool,
    #[serde(alias = "logLevel")]
    pub log_level: String,
    #[serde(alias = "engineThreadName")]
    pub engine_thread_name: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            uuid_prefix: DEFAULT_UUID_PREFIX.to_string(),
            warn_unmatched_replies: false,
            log_level: "info".to_string(),
            engine_thread_name: "cbox-engine".to_string(),
        }
    }
}

impl ClientSettings {
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = dirs::config_dir().context("Could not resolve config dir")?;
        Ok(base.join("cbox").join("client.json"))
    }

    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("read settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse settings {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("write settings {}", path.display()))
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
