//! Configuration types for the engine and its tools.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Search driver limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Site samples per requested mutation. Single-application recipes get exactly
    /// this many attempts; the correctness recipe gets this times its target count.
    pub attempts_per_mutation: u32,
    /// Lower bound of the correctness recipe's target mutation count
    pub min_mutations: u32,
    /// Upper bound (inclusive) of the correctness recipe's target mutation count
    pub max_mutations: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attempts_per_mutation: 100,
            min_mutations: 1,
            max_mutations: 5,
        }
    }
}

/// Corpus merge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Minimum number of function definitions in the merged program
    pub batch_size: usize,
    /// Reject functions containing floating point operations
    pub ignore_fp: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            batch_size: 128,
            ignore_fp: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info,irmut_ir=debug".to_string(),
            json: false,
        }
    }
}

/// Top level configuration, optionally loaded from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IrmutConfig {
    pub engine: EngineConfig,
    pub merge: MergeConfig,
    pub log: LogConfig,
}

impl IrmutConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
