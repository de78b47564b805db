//! Compiler Configuration
//!
//! Built once at startup and handed to every `QueryCompiler` by reference.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use crate::coercion::CoercionStrategy;
use crate::pagination::DEFAULT_LIMIT;

/// When the external search index suppresses the native text condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSuppression {
    /// Only pipeline compilation honors the external index flag;
    /// flat compilation always emits the text condition
    #[default]
    PipelineOnly,
    /// Both modes honor the external index flag
    AllModes,
}

/// How several clauses on the same field are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateFieldPolicy {
    /// The later clause replaces the earlier one
    #[default]
    LastWriteWins,
    /// Every clause is kept and the field is ANDed under `$and`
    Conjunction,
}

/// Query compiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// How string filter values are coerced (default: none)
    #[serde(default)]
    pub coercion: CoercionStrategy,

    /// Which modes honor the external search index flag (default: pipeline only)
    #[serde(default)]
    pub search_suppression: SearchSuppression,

    /// Same-field clause policy (default: last write wins)
    #[serde(default)]
    pub duplicate_fields: DuplicateFieldPolicy,

    /// Limit used when the request limit is zero (default: 10)
    #[serde(default = "default_limit")]
    pub default_limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            coercion: CoercionStrategy::default(),
            search_suppression: SearchSuppression::default(),
            duplicate_fields: DuplicateFieldPolicy::default(),
            default_limit: default_limit(),
        }
    }
}

impl CompilerConfig {
    /// Object-id coercion with every other setting at its default
    pub fn reference() -> Self {
        Self::default().with_coercion(CoercionStrategy::ObjectId)
    }

    pub fn with_coercion(mut self, coercion: CoercionStrategy) -> Self {
        self.coercion = coercion;
        self
    }

    pub fn with_search_suppression(mut self, suppression: SearchSuppression) -> Self {
        self.search_suppression = suppression;
        self
    }

    pub fn with_duplicate_fields(mut self, policy: DuplicateFieldPolicy) -> Self {
        self.duplicate_fields = policy;
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: CompilerConfig = serde_json::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == 0 {
            return Err(ConfigError::Invalid("default_limit must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.coercion, CoercionStrategy::None);
        assert_eq!(config.search_suppression, SearchSuppression::PipelineOnly);
        assert_eq!(config.duplicate_fields, DuplicateFieldPolicy::LastWriteWins);
        assert_eq!(config.default_limit, 10);
    }

    #[test]
    fn test_reference_config() {
        let config = CompilerConfig::reference();
        assert_eq!(config.coercion, CoercionStrategy::ObjectId);
        assert_eq!(config.search_suppression, SearchSuppression::PipelineOnly);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CompilerConfig =
            serde_json::from_value(json!({"search_suppression": "all_modes"})).unwrap();
        assert_eq!(config.search_suppression, SearchSuppression::AllModes);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.coercion, CoercionStrategy::None);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("querycraft.json");
        fs::write(
            &path,
            json!({"coercion": "object_id", "duplicate_fields": "conjunction"}).to_string(),
        )
        .unwrap();

        let config = CompilerConfig::load(&path).unwrap();
        assert_eq!(config.coercion, CoercionStrategy::ObjectId);
        assert_eq!(config.duplicate_fields, DuplicateFieldPolicy::Conjunction);
    }

    #[test]
    fn test_load_rejects_zero_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("querycraft.json");
        fs::write(&path, json!({"default_limit": 0}).to_string()).unwrap();

        assert!(matches!(
            CompilerConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = CompilerConfig::load(&temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
        assert!(err.to_string().contains("Failed to read config"));
    }
}
