//! Configuration for the recall memory system.
//!
//! Maps directly to `recall.toml`. Every field has a default, so an empty
//! document is a valid configuration.

use serde::{Deserialize, Serialize};

use recall_llm::LlmConfig;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Memory retrieval and storage settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl RecallConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `RecallError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::RecallError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Which in-process vector store backs a memory engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Exact linear cosine scan.
    #[default]
    BruteForce,
    /// Approximate nearest-neighbour graph.
    Hnsw,
}

/// Memory retrieval and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// `top_k` used when a retrieval call does not pass one.
    #[serde(default = "default_5_usize")]
    pub default_memories_returned: usize,
    /// Vector store implementation.
    #[serde(default)]
    pub store: StoreKind,
    /// HNSW `ef_construction` (higher = more accurate build, slower).
    #[serde(default = "default_100")]
    pub hnsw_ef_construction: usize,
    /// HNSW `ef_search` (higher = more accurate search, slower).
    #[serde(default = "default_50")]
    pub hnsw_ef_search: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_memories_returned: 5,
            store: StoreKind::BruteForce,
            hnsw_ef_construction: 100,
            hnsw_ef_search: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_log_level() -> String {
    "info".to_string()
}
const fn default_5_usize() -> usize {
    5
}
const fn default_50() -> usize {
    50
}
const fn default_100() -> usize {
    100
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
