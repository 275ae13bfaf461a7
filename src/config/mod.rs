//! Configuration module for displaykit
//!
//! The engine configuration selects the formula dialect and parser limits
//! and sizes the realtime/archive buffers of each widget kind.
//!
//! # Location
//!
//! The default configuration file lives in the platform config directory:
//! - **Linux**: `~/.config/displaykit/engine.toml`
//! - **macOS**: `~/Library/Application Support/displaykit/engine.toml`
//! - **Windows**: `%APPDATA%\displaykit\engine.toml`
//!
//! Files ending in `.json` are read and written as JSON, everything else as
//! TOML.
//!
//! # Example
//!
//! ```toml
//! [formula]
//! dialect = "legacy"
//! max_depth = 64
//!
//! [buffers.activities]
//! capacity = 200
//! watermark = 150
//! dedup = "by_id"
//! ```

use crate::error::{DisplayError, Result, ResultExt};
use crate::formula::{Dialect, ParseOptions, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "displaykit";

/// Engine configuration filename
pub const CONFIG_FILE: &str = "engine.toml";

/// Default number of entries kept by a scrollback buffer
pub const DEFAULT_SCROLLBACK_CAPACITY: usize = 500;

/// Default number of entries kept when a buffer is compacted
pub const DEFAULT_COMPACT_LIMIT: usize = 100;

// ==================== Config Directory ====================

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default engine configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

// ==================== Formula Settings ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaSettings {
    /// Dialect new formulas are parsed in
    #[serde(default)]
    pub dialect: Dialect,

    /// Maximum expression nesting accepted by the parser
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for FormulaSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FormulaSettings {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            dialect: self.dialect,
            max_depth: self.max_depth,
        }
    }
}

// ==================== Buffer Settings ====================

/// How realtime entries are merged with archive entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// A realtime entry replaces the entry with the same key
    #[default]
    ById,
    /// Every entry is kept
    Append,
}

/// Sizing of one realtime/archive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Number of realtime entries held before further ones are dropped
    pub capacity: usize,

    /// Realtime count at which the watermark callback fires
    pub watermark: usize,

    #[serde(default)]
    pub dedup: DedupPolicy,
}

impl BufferConfig {
    pub fn new(capacity: usize, watermark: usize) -> Self {
        Self {
            capacity,
            watermark,
            dedup: DedupPolicy::ById,
        }
    }

    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Check `capacity > 0` and `watermark < capacity`
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(DisplayError::Config(
                "buffer capacity must be greater than zero".to_string(),
            ));
        }
        if self.watermark >= self.capacity {
            return Err(DisplayError::Config(format!(
                "buffer watermark {} must be below capacity {}",
                self.watermark, self.capacity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSettings {
    #[serde(default = "default_scrollback_capacity")]
    pub scrollback_capacity: usize,

    /// Entries kept by `RealtimeArchiveBuffer::compact_to_limit`
    #[serde(default = "default_compact_limit")]
    pub compact_limit: usize,

    #[serde(default = "default_activities")]
    pub activities: BufferConfig,

    #[serde(default = "default_command_history")]
    pub command_history: BufferConfig,

    #[serde(default = "default_plot_samples")]
    pub plot_samples: BufferConfig,

    #[serde(default = "default_stream_rows")]
    pub stream_rows: BufferConfig,
}

fn default_activities() -> BufferConfig {
    BufferConfig::new(100, 80)
}

fn default_command_history() -> BufferConfig {
    BufferConfig::new(200, 150)
}

fn default_plot_samples() -> BufferConfig {
    BufferConfig::new(500, 400).with_dedup(DedupPolicy::Append)
}

fn default_stream_rows() -> BufferConfig {
    BufferConfig::new(100, 80)
}

fn default_scrollback_capacity() -> usize {
    DEFAULT_SCROLLBACK_CAPACITY
}

fn default_compact_limit() -> usize {
    DEFAULT_COMPACT_LIMIT
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            activities: default_activities(),
            command_history: default_command_history(),
            plot_samples: default_plot_samples(),
            stream_rows: default_stream_rows(),
            scrollback_capacity: DEFAULT_SCROLLBACK_CAPACITY,
            compact_limit: DEFAULT_COMPACT_LIMIT,
        }
    }
}

impl BufferSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, config) in [
            ("activities", &self.activities),
            ("command_history", &self.command_history),
            ("plot_samples", &self.plot_samples),
            ("stream_rows", &self.stream_rows),
        ] {
            config
                .validate()
                .map_err(|e| e.with_context(format!("buffers.{}", name)))?;
        }
        if self.scrollback_capacity == 0 {
            return Err(DisplayError::Config(
                "buffers.scrollback_capacity must be greater than zero".to_string(),
            ));
        }
        if self.compact_limit == 0 {
            return Err(DisplayError::Config(
                "buffers.compact_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Engine Config ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub formula: FormulaSettings,

    #[serde(default)]
    pub buffers: BufferSettings,
}

impl EngineConfig {
    /// Load a configuration file, TOML or JSON by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(DisplayError::from)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Self = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| {
                DisplayError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                DisplayError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the default configuration file, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load engine config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to disk, TOML or JSON by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(DisplayError::from)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = if is_json(path) {
            serde_json::to_string_pretty(self)
                .map_err(|e| DisplayError::Serialization(e.to_string()))?
        } else {
            toml::to_string_pretty(self).map_err(|e| DisplayError::Serialization(e.to_string()))?
        };

        std::fs::write(path, content)
            .map_err(DisplayError::from)
            .with_context(|| format!("Failed to write config file {:?}", path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.formula.max_depth == 0 {
            return Err(DisplayError::Config(
                "formula.max_depth must be greater than zero".to_string(),
            ));
        }
        self.buffers.validate()
    }
}
