//! Assigns categories to bank statement lines from their description,
//! declared type and amount.
//!
//! [`CategorizationEngine`] owns the rule table and the learning store;
//! [`CorrectionLayer`] wraps it with an income/expense sanity check.

pub mod config;
pub mod correction;
pub mod engine;
pub mod error;
pub mod learning;
pub mod matcher;
pub mod patterns;
pub mod rules;
pub(crate) mod util;

pub use config::{EngineConfig, KeywordExtension};
pub use correction::{CorrectionLayer, ImprovedCategorizationResult, TypeCorrection, TypeCorrector};
pub use engine::{CategorizationEngine, CategorizeOptions, CategorizedTransaction};
pub use error::{ConfigError, EngineError};
pub use learning::{LearningFeedback, LearningRecord, LearningStats, LearningStore};
pub use matcher::{CategorizationResult, MatchCandidate, MatchMethod, Matcher};
pub use rules::{
    default_category_for, CategoryRule, RuleDatabase, DEFAULT_EXPENSE_CATEGORY,
    DEFAULT_INCOME_CATEGORY,
};

pub use classifica_core::{Money, TransactionContext, TransactionRecord, TransactionType};
