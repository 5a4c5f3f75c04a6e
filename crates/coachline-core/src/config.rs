use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::endpoint::ExecutionContext;

pub const API_URL_ENV: &str = "COACHLINE_API_URL";
pub const ORIGIN_ENV: &str = "COACHLINE_ORIGIN";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Backend base address override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Origin this client is deployed under, used for same-origin resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Replaces the seeded assistant greeting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Apply `COACHLINE_API_URL` / `COACHLINE_ORIGIN` on top of the file values.
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(ORIGIN_ENV).ok(),
        )
    }

    /// Non-empty overrides replace the configured values.
    pub fn with_overrides(mut self, api_url: Option<String>, origin: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url);
        }
        if let Some(origin) = origin.filter(|o| !o.trim().is_empty()) {
            self.origin = Some(origin);
        }
        self
    }

    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext {
            api_url: self.api_url.clone(),
            origin: self.origin.clone(),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("coachline").join("config.json"))
    }
}
