/*!
 * Application configuration module.
 *
 * This module handles the application configuration including loading,
 * validating and saving configuration settings.
 */

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Reference segment length the upload gate trusts for the LLM backend
pub const DEFAULT_SEG_LENGTH: usize = 500;

/// Reference previous-context length the upload gate trusts for the LLM backend
pub const DEFAULT_PREV_SEG_LENGTH: usize = 500;

/// Translation backend kind
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Generic web machine-translation service
    #[default]
    WebMt,
    /// Specialized fine-tuned LLM served over an OpenAI-compatible API
    Llm,
    /// Local offline engine
    Local,
}

impl BackendKind {
    /// Capitalized backend name for display
    pub fn display_name(&self) -> &str {
        match self {
            Self::WebMt => "Web MT",
            Self::Llm => "LLM",
            Self::Local => "Local",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WebMt => "webmt",
            Self::Llm => "llm",
            Self::Local => "local",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "webmt" => Ok(Self::WebMt),
            "llm" => Ok(Self::Llm),
            "local" => Ok(Self::Local),
            _ => Err(anyhow!("Invalid backend kind: {}", s)),
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Which backend translates documents
    #[serde(default)]
    pub backend: BackendKind,

    /// Endpoint of the backend service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Segment length for the LLM backend, in characters
    #[serde(default)]
    pub seg_length: Option<usize>,

    /// Previous-context length for the LLM backend, in characters
    #[serde(default)]
    pub prev_seg_length: Option<usize>,

    /// Target language code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            endpoint: default_endpoint(),
            seg_length: None,
            prev_seg_length: None,
            target_language: default_target_language(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the given path if it exists, otherwise fall back to defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Default config file location under the user configuration directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("noveltrans").join("config.json"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("Endpoint cannot be empty"));
        }
        url::Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", self.endpoint))?;
        if let Some(len) = self.seg_length {
            if len == 0 {
                return Err(anyhow!("seg_length must be greater than zero"));
            }
        }
        Ok(())
    }

    /// Segment length for the LLM backend, falling back to the reference default
    pub fn seg_length_or_default(&self) -> usize {
        self.seg_length.unwrap_or(DEFAULT_SEG_LENGTH)
    }

    /// Previous-context length for the LLM backend, falling back to the reference default
    pub fn prev_seg_length_or_default(&self) -> usize {
        self.prev_seg_length.unwrap_or(DEFAULT_PREV_SEG_LENGTH)
    }
}
