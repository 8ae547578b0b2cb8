//! Harness settings: built-in defaults, then `config.yaml`, then the
//! environment.

use crate::error::{GeoBenchError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// OpenAI-compatible endpoint serving a vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Server root, without `/v1/chat/completions`.
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
        }
    }
}

/// Street View Static API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetViewConfig {
    /// Google Maps API key; the tool refuses to run without one.
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub street_view: StreetViewConfig,
}

impl Config {
    /// Defaults, overlaid by the user config file if present, overlaid by
    /// `LLM_API_BASE`, `LLM_API_KEY`, `LLM_MODEL`, `LLM_MAX_TOKENS`,
    /// `LLM_TEMPERATURE` and `GOOGLE_MAPS_API_KEY`.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        let var = |name: &str| env::var(name).ok();

        if let Some(value) = var("LLM_API_BASE") {
            self.llm.api_base = value;
        }
        if let Some(value) = var("LLM_API_KEY") {
            self.llm.api_key = value;
        }
        if let Some(value) = var("LLM_MODEL") {
            self.llm.model = value;
        }
        // Unparseable numbers keep the previous value.
        if let Some(tokens) = var("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.llm.max_tokens = tokens;
        }
        if let Some(temperature) = var("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.llm.temperature = temperature;
        }
        if let Some(value) = var("GOOGLE_MAPS_API_KEY") {
            self.street_view.api_key = value;
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GeoBenchError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Missing sections and keys fall back to defaults.
    fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| GeoBenchError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// `~/.config/geolocation-bench/config.yaml` on Linux.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "geolocation-bench")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// A benchmark run needs an endpoint, a key and a model.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("LLM API base URL", "LLM_API_BASE", &self.llm.api_base),
            ("LLM API key", "LLM_API_KEY", &self.llm.api_key),
            ("LLM model", "LLM_MODEL", &self.llm.model),
        ];
        for (what, var, value) in required {
            if value.is_empty() {
                return Err(GeoBenchError::Config(format!(
                    "{} is required. Set {} or add it to the config file.",
                    what, var
                )));
            }
        }
        Ok(())
    }

    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
