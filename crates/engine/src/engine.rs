use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use classifica_core::{TransactionRecord, TransactionType};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError};
use crate::learning::{
    LearningFeedback, LearningRecord, LearningStats, LearningStore, LEARNED_CONFIDENCE,
};
use crate::matcher::{CategorizationResult, MatchMethod, Matcher};
use crate::rules::{default_category_for, RuleDatabase, DEFAULT_CONFIDENCE};

/// Per-call overrides. Unset fields fall back to the engine's config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeOptions {
    pub min_confidence: Option<u8>,
    pub enable_learning: Option<bool>,
    /// Restrict matching to these category names.
    pub available_categories: Option<Vec<String>>,
}

impl CategorizeOptions {
    pub fn min_confidence(mut self, min_confidence: u8) -> Self {
        self.min_confidence = Some(min_confidence.min(100));
        self
    }

    pub fn enable_learning(mut self, enable: bool) -> Self {
        self.enable_learning = Some(enable);
        self
    }

    pub fn available_categories<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.available_categories = Some(names.iter().map(|n| n.as_ref().to_string()).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    pub transaction: TransactionRecord,
    pub categorization: CategorizationResult,
}

/// Owns the rule table and the learning store. Construct once and share
/// by reference (or `Arc`) across threads.
pub struct CategorizationEngine {
    config: EngineConfig,
    matcher: Matcher,
    rules: RwLock<Arc<RuleDatabase>>,
    learning: RwLock<LearningStore>,
}

impl Default for CategorizationEngine {
    fn default() -> Self {
        Self::with_rules(EngineConfig::default(), RuleDatabase::default())
    }
}

impl CategorizationEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = config.build_rules()?;
        Ok(Self::with_rules(config, rules))
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Self::new(EngineConfig::from_toml(toml_content)?)
    }

    pub fn with_rules(config: EngineConfig, rules: RuleDatabase) -> Self {
        let learning = LearningStore::with_capacity(config.learning_capacity);
        Self {
            config,
            matcher: Matcher::default(),
            rules: RwLock::new(Arc::new(rules)),
            learning: RwLock::new(learning),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consistent view of the rule table as of this call.
    pub fn rules_snapshot(&self) -> Arc<RuleDatabase> {
        Arc::clone(&self.rules.read())
    }

    pub fn category_names(&self, tx_type: TransactionType) -> Vec<String> {
        self.rules_snapshot().category_names(tx_type)
    }

    pub fn categorize(
        &self,
        tx: &TransactionRecord,
        options: &CategorizeOptions,
    ) -> CategorizationResult {
        self.categorize_description(&tx.description, tx.tx_type, options)
    }

    /// Learned feedback first, then the matcher; anything below the
    /// confidence threshold becomes the type's default category.
    pub fn categorize_description(
        &self,
        description: &str,
        tx_type: TransactionType,
        options: &CategorizeOptions,
    ) -> CategorizationResult {
        let enable_learning = options.enable_learning.unwrap_or(self.config.enable_learning);
        if enable_learning {
            if let Some(record) = self.learning.read().find(description) {
                debug!(description, category = %record.user_category, "learned match");
                let mut result = CategorizationResult::new(
                    &record.user_category,
                    LEARNED_CONFIDENCE,
                    MatchMethod::Learned,
                );
                result.matched_keyword = Some(record.description.clone());
                return result;
            }
        }

        let available: Option<HashSet<String>> = options
            .available_categories
            .as_ref()
            .map(|names| names.iter().cloned().collect());
        let rules = self.rules_snapshot();
        let min_confidence = options.min_confidence.unwrap_or(self.config.min_confidence);

        match self
            .matcher
            .match_description(&rules, description, tx_type, available.as_ref())
        {
            Some(result) if result.confidence >= min_confidence => result,
            Some(below) => {
                debug!(
                    description,
                    category = %below.category,
                    confidence = below.confidence,
                    min_confidence,
                    "best match below threshold, using default category"
                );
                fallback(tx_type)
            }
            None => {
                debug!(description, "no match, using default category");
                fallback(tx_type)
            }
        }
    }

    /// Categorizes every transaction independently. Output order follows
    /// input order; a failing item gets the default category.
    pub fn categorize_batch(
        &self,
        transactions: &[TransactionRecord],
        options: &CategorizeOptions,
    ) -> Vec<CategorizedTransaction> {
        let workers = self.worker_count().min(transactions.len()).max(1);

        let results: Vec<CategorizationResult> =
            if transactions.len() <= self.config.parallel_batch_threshold || workers == 1 {
                transactions
                    .iter()
                    .map(|tx| self.categorize_isolated(tx, options))
                    .collect()
            } else {
                let chunk_size = transactions.len().div_ceil(workers);
                let mut slots: Vec<Option<CategorizationResult>> = vec![None; transactions.len()];
                std::thread::scope(|scope| {
                    for (txs, out) in transactions
                        .chunks(chunk_size)
                        .zip(slots.chunks_mut(chunk_size))
                    {
                        scope.spawn(move || {
                            for (tx, slot) in txs.iter().zip(out.iter_mut()) {
                                *slot = Some(self.categorize_isolated(tx, options));
                            }
                        });
                    }
                });
                slots
                    .into_iter()
                    .zip(transactions)
                    .map(|(slot, tx)| slot.unwrap_or_else(|| fallback(tx.tx_type)))
                    .collect()
            };

        transactions
            .iter()
            .cloned()
            .zip(results)
            .map(|(transaction, categorization)| CategorizedTransaction {
                transaction,
                categorization,
            })
            .collect()
    }

    fn categorize_isolated(
        &self,
        tx: &TransactionRecord,
        options: &CategorizeOptions,
    ) -> CategorizationResult {
        catch_unwind(AssertUnwindSafe(|| self.categorize(tx, options))).unwrap_or_else(|_| {
            warn!(description = %tx.description, "categorization failed, using default category");
            fallback(tx.tx_type)
        })
    }

    fn worker_count(&self) -> usize {
        self.config.max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Records user feedback. Returns false when learning is disabled or
    /// the description is blank.
    pub fn learn(&self, feedback: LearningFeedback) -> bool {
        if !self.config.enable_learning || feedback.description.trim().is_empty() {
            return false;
        }
        let record = LearningRecord::from_feedback(feedback, Utc::now());
        debug!(
            description = %record.description,
            category = %record.user_category,
            "learning from feedback"
        );
        let evicted = self.learning.write().push(record);
        if evicted > 0 {
            debug!(evicted, "oldest learning records evicted");
        }
        true
    }

    pub fn get_stats(&self) -> LearningStats {
        self.learning.read().stats()
    }

    pub fn export_learning_data(&self) -> Vec<LearningRecord> {
        self.learning.read().export()
    }

    /// Replaces the learning store with `records`.
    pub fn import_learning_data(&self, records: Vec<LearningRecord>) {
        let count = records.len();
        let mut store = self.learning.write();
        store.replace(records);
        info!(imported = count, kept = store.len(), "learning data imported");
    }

    pub fn export_learning_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&self.export_learning_data())?)
    }

    /// Parses a learning export and replaces the store with it. Returns the
    /// number of records kept.
    pub fn import_learning_json(&self, json: &str) -> Result<usize, EngineError> {
        let records: Vec<LearningRecord> = serde_json::from_str(json)?;
        self.import_learning_data(records);
        Ok(self.learning.read().len())
    }

    pub fn add_keyword_to_category(&self, category: &str, keyword: &str) -> bool {
        let mut guard = self.rules.write();
        Arc::make_mut(&mut guard).add_keyword(category, keyword)
    }

    pub fn remove_keyword_from_category(&self, category: &str, keyword: &str) -> bool {
        let mut guard = self.rules.write();
        Arc::make_mut(&mut guard).remove_keyword(category, keyword)
    }
}

fn fallback(tx_type: TransactionType) -> CategorizationResult {
    CategorizationResult::new(
        default_category_for(tx_type),
        DEFAULT_CONFIDENCE,
        MatchMethod::Default,
    )
}
