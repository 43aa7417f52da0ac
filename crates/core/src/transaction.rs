use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// Declared direction of a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn opposite(self) -> Self {
        match self {
            TransactionType::Income => TransactionType::Expense,
            TransactionType::Expense => TransactionType::Income,
        }
    }

    /// Portuguese label used in user-facing messages.
    pub fn label_pt(self) -> &'static str {
        match self {
            TransactionType::Income => "receita",
            TransactionType::Expense => "despesa",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "receita" => Ok(TransactionType::Income),
            "expense" | "despesa" => Ok(TransactionType::Expense),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    CreditCard,
    Investment,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Checking => write!(f, "checking"),
            AccountKind::Savings => write!(f, "savings"),
            AccountKind::CreditCard => write!(f, "credit_card"),
            AccountKind::Investment => write!(f, "investment"),
        }
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "credit_card" => Ok(AccountKind::CreditCard),
            "investment" => Ok(AccountKind::Investment),
            other => Err(format!("Unknown account kind: '{other}'")),
        }
    }
}

/// A statement line as handed over by the import layer.
///
/// `category` and `tags` belong to the caller and pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TransactionRecord {
    pub fn new(date: NaiveDate, description: &str, amount: Money, tx_type: TransactionType) -> Self {
        TransactionRecord {
            date,
            description: description.to_string(),
            amount,
            tx_type,
            category: None,
            tags: Vec::new(),
        }
    }
}

/// Per-call input of the type-correction layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionContext {
    pub description: String,
    pub amount: Money,
    pub original_type: TransactionType,
    pub date: Option<NaiveDate>,
    pub account_kind: Option<AccountKind>,
}

impl TransactionContext {
    pub fn new(description: &str, amount: Money, original_type: TransactionType) -> Self {
        TransactionContext {
            description: description.to_string(),
            amount,
            original_type,
            date: None,
            account_kind: None,
        }
    }
}

impl From<&TransactionRecord> for TransactionContext {
    fn from(tx: &TransactionRecord) -> Self {
        TransactionContext {
            description: tx.description.clone(),
            amount: tx.amount,
            original_type: tx.tx_type,
            date: Some(tx.date),
            account_kind: None,
        }
    }
}
