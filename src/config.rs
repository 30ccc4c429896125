//! Engine configuration
//!
//! One JSON document holds the rule table and the clustering parameters.
//! Either section may be omitted; omitted sections take the canonical table
//! and the default clustering parameters.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

use crate::classifier::HealthClassifier;
use crate::clusterer::ClusterConfig;
use crate::rules::RuleTable;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RuleTable,
    pub clustering: ClusterConfig,
}

impl EngineConfig {
    /// Load and validate configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config: {:?}", path))?;

        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse engine config JSON: {:?}", path))?;

        config.rules.validate()
            .with_context(|| format!("Rule table in {:?} is invalid", path))?;
        config.clustering.validate()
            .with_context(|| format!("Clustering section in {:?} is invalid", path))?;

        Ok(config)
    }

    pub fn classifier(&self) -> Result<HealthClassifier> {
        Ok(HealthClassifier::new(self.rules.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}.json", name, std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let path = write_temp("palm_engine_empty", "{}");
        let config = EngineConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.classifier().unwrap().max_score(), 12);
    }

    #[test]
    fn test_clustering_override() {
        let path = write_temp("palm_engine_seed", r#"{"clustering": {"seed": 7, "n_init": 4}}"#);
        let config = EngineConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(config.clustering.seed, 7);
        assert_eq!(config.clustering.n_init, 4);
        assert_eq!(config.clustering.k, 3);
    }

    #[test]
    fn test_invalid_clustering_rejected() {
        let path = write_temp("palm_engine_bad", r#"{"clustering": {"k": 0}}"#);
        let result = EngineConfig::load(&path);
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/palm_engine.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read engine config"));
    }
}
