use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Rule '{key}' has confidence {confidence}, must be between 0 and 100")]
    InvalidConfidence { key: String, confidence: u8 },
    #[error("Rule '{key}' has priority 0, must be at least 1")]
    InvalidPriority { key: String },
    #[error("Duplicate rule key: {0}")]
    DuplicateRuleKey(String),
    #[error("Rule '{0}' has an empty name")]
    EmptyRuleName(String),
    #[error("min_confidence {0} is above 100")]
    InvalidMinConfidence(u8),
    #[error("learning_capacity must be at least 1")]
    ZeroLearningCapacity,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Learning data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
