//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default bound on nested composite expansion.
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 16;

/// How much of each block output is logged in debug mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugGranularity {
    /// One summary line per block
    #[default]
    Minimal,
    /// Summary plus every row of sheets and tables
    Exhaustive,
    /// Nothing
    Skip,
}

/// Configuration for the pipeline execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum depth of nested composite block types.
    pub max_expansion_depth: usize,

    /// Keep every block's output in the outcome.
    pub extract_outputs: bool,

    /// Directory the local file extractor may read from. Defaults to the
    /// working directory of the process.
    pub file_root: Option<PathBuf>,

    /// Log block outputs.
    pub debug: bool,

    pub debug_granularity: DebugGranularity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            extract_outputs: false,
            file_root: None,
            debug: false,
            debug_granularity: DebugGranularity::Minimal,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_expansion_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_expansion_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn with_extract_outputs(mut self, extract_outputs: bool) -> Self {
        self.extract_outputs = extract_outputs;
        self
    }

    pub fn with_file_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.file_root = Some(root.into());
        self
    }

    pub fn with_debug(mut self, granularity: DebugGranularity) -> Self {
        self.debug = true;
        self.debug_granularity = granularity;
        self
    }

    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration syntax: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_expansion_depth, 16);
        assert!(!config.extract_outputs);
        assert!(config.file_root.is_none());
        assert_eq!(config.debug_granularity, DebugGranularity::Minimal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "debug": true, "debug_granularity": "exhaustive" }"#,
        )
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.debug_granularity, DebugGranularity::Exhaustive);
        assert_eq!(config.max_expansion_depth, DEFAULT_MAX_EXPANSION_DEPTH);
    }

    #[test]
    fn test_zero_depth_is_invalid() {
        let err = EngineConfig::from_json_str(r#"{ "max_expansion_depth": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "extract_outputs": true, "file_root": "/data" }}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert!(config.extract_outputs);
        assert_eq!(config.file_root, Some(PathBuf::from("/data")));

        let missing = EngineConfig::from_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
