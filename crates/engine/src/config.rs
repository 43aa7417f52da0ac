use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::learning::DEFAULT_LEARNING_CAPACITY;
use crate::rules::{CategoryRule, RuleDatabase};

/// Extra keywords appended to an existing category at load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordExtension {
    /// Category name or rule key.
    pub category: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_confidence: u8,
    pub enable_learning: bool,
    pub learning_capacity: usize,
    /// Batches of at most this many transactions run on the calling thread.
    pub parallel_batch_threshold: usize,
    /// Defaults to the available parallelism.
    pub max_workers: Option<usize>,
    /// Replace built-in rules by key, or add new ones.
    pub rules: Vec<CategoryRule>,
    pub keywords: Vec<KeywordExtension>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 70,
            enable_learning: true,
            learning_capacity: DEFAULT_LEARNING_CAPACITY,
            parallel_batch_threshold: 64,
            max_workers: None,
            rules: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_confidence > 100 {
            return Err(ConfigError::InvalidMinConfidence(self.min_confidence));
        }
        if self.learning_capacity == 0 {
            return Err(ConfigError::ZeroLearningCapacity);
        }
        Ok(())
    }

    /// The built-in table with this config's rules and keywords applied.
    pub fn build_rules(&self) -> Result<RuleDatabase, ConfigError> {
        let mut db = RuleDatabase::default();
        for rule in &self.rules {
            db.upsert(rule.clone())?;
        }
        for ext in &self.keywords {
            for keyword in &ext.keywords {
                db.add_keyword(&ext.category, keyword);
            }
        }
        Ok(db)
    }
}
