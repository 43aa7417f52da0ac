use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::normalize;

/// Records kept by default; older ones are evicted first.
pub const DEFAULT_LEARNING_CAPACITY: usize = 1000;

/// Confidence of every learned assignment.
pub const LEARNED_CONFIDENCE: u8 = 100;

/// Feedback as supplied by the user. The timestamp is assigned on `learn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningFeedback {
    pub description: String,
    pub user_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_category: Option<String>,
}

impl LearningFeedback {
    pub fn new(description: &str, user_category: &str) -> Self {
        LearningFeedback {
            description: description.to_string(),
            user_category: user_category.to_string(),
            original_category: None,
        }
    }

    pub fn with_original(mut self, original_category: &str) -> Self {
        self.original_category = Some(original_category.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecord {
    pub description: String,
    pub user_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_category: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LearningRecord {
    pub fn from_feedback(feedback: LearningFeedback, timestamp: DateTime<Utc>) -> Self {
        LearningRecord {
            description: feedback.description,
            user_category: feedback.user_category,
            original_category: feedback.original_category,
            timestamp,
        }
    }

    /// Equal to, contains, or is contained by `normalized` (already trimmed
    /// and lower-cased).
    fn matches(&self, normalized: &str) -> bool {
        let own = normalize(&self.description);
        !own.is_empty() && (own == normalized || normalized.contains(&own) || own.contains(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub total_categorized: usize,
    pub average_confidence: f64,
    pub learning_data_count: usize,
    pub category_distribution: BTreeMap<String, usize>,
}

/// Bounded FIFO of user feedback.
#[derive(Debug, Clone)]
pub struct LearningStore {
    records: VecDeque<LearningRecord>,
    capacity: usize,
}

impl Default for LearningStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LEARNING_CAPACITY)
    }
}

impl LearningStore {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_LEARNING_CAPACITY)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a record, evicting the oldest ones past capacity. Returns
    /// how many were evicted.
    pub fn push(&mut self, record: LearningRecord) -> usize {
        self.records.push_back(record);
        let mut evicted = 0;
        while self.records.len() > self.capacity {
            self.records.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Most recent record whose description matches `description`.
    pub fn find(&self, description: &str) -> Option<&LearningRecord> {
        let normalized = normalize(description);
        if normalized.is_empty() {
            return None;
        }
        self.records.iter().rev().find(|r| r.matches(&normalized))
    }

    /// Replaces the whole store; only the newest `capacity` records survive.
    pub fn replace(&mut self, records: Vec<LearningRecord>) {
        let skip = records.len().saturating_sub(self.capacity);
        self.records = records.into_iter().skip(skip).collect();
    }

    /// Oldest first.
    pub fn export(&self) -> Vec<LearningRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn stats(&self) -> LearningStats {
        let mut category_distribution = BTreeMap::new();
        for r in &self.records {
            *category_distribution.entry(r.user_category.clone()).or_insert(0) += 1;
        }
        let count = self.records.len();
        LearningStats {
            total_categorized: count,
            average_confidence: if count == 0 { 0.0 } else { f64::from(LEARNED_CONFIDENCE) },
            learning_data_count: count,
            category_distribution,
        }
    }
}
