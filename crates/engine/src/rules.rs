use std::collections::{BTreeMap, HashSet};

use classifica_core::TransactionType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::util::normalize;

pub const DEFAULT_INCOME_CATEGORY: &str = "Outros Recebimentos";
pub const DEFAULT_EXPENSE_CATEGORY: &str = "Outros Gastos";

/// Confidence reported by the fallback category.
pub const DEFAULT_CONFIDENCE: u8 = 50;

pub fn default_category_for(tx_type: TransactionType) -> &'static str {
    match tx_type {
        TransactionType::Income => DEFAULT_INCOME_CATEGORY,
        TransactionType::Expense => DEFAULT_EXPENSE_CATEGORY,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: TransactionType,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Ceiling: no candidate built from this rule reports more.
    pub confidence: u8,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_priority() -> u32 {
    1
}

impl CategoryRule {
    pub fn new(
        key: &str,
        name: &str,
        rule_type: TransactionType,
        keywords: &[&str],
        confidence: u8,
        priority: u32,
    ) -> Self {
        CategoryRule {
            key: key.to_string(),
            name: name.to_string(),
            rule_type,
            keywords: keywords.iter().map(|k| normalize(k)).collect(),
            confidence,
            priority,
        }
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        let keyword = normalize(keyword);
        self.keywords.iter().any(|k| *k == keyword)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyRuleName(self.key.clone()));
        }
        if self.confidence > 100 {
            return Err(ConfigError::InvalidConfidence {
                key: self.key.clone(),
                confidence: self.confidence,
            });
        }
        if self.priority == 0 {
            return Err(ConfigError::InvalidPriority { key: self.key.clone() });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RuleTable {
    #[serde(default)]
    rules: Vec<CategoryRule>,
}

/// The category rule table. Keeps table order, which the matcher uses to
/// order candidates of equal score.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDatabase {
    rules: Vec<CategoryRule>,
}

impl Default for RuleDatabase {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(key, name, rule_type, confidence, priority, keywords)| {
                CategoryRule::new(key, name, *rule_type, keywords, *confidence, *priority)
            })
            .collect();
        Self { rules }
    }
}

impl RuleDatabase {
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());
        for mut rule in rules {
            rule.validate()?;
            if !seen.insert(rule.key.clone()) {
                return Err(ConfigError::DuplicateRuleKey(rule.key));
            }
            rule.keywords = dedup_keywords(&rule.keywords);
            normalized.push(rule);
        }
        Ok(Self { rules: normalized })
    }

    /// Loads a complete rule table from `[[rules]]` entries.
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let table: RuleTable = toml::from_str(toml_content)?;
        Self::new(table.rules)
    }

    /// Replaces rules with a matching key and appends the rest.
    pub fn upsert(&mut self, mut rule: CategoryRule) -> Result<(), ConfigError> {
        rule.validate()?;
        rule.keywords = dedup_keywords(&rule.keywords);
        match self.rules.iter_mut().find(|r| r.key == rule.key) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    /// Rules of one type, in table order.
    pub fn iter_type(&self, rule_type: TransactionType) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter().filter(move |r| r.rule_type == rule_type)
    }

    pub fn get_by_type(&self, rule_type: TransactionType) -> BTreeMap<&str, &CategoryRule> {
        self.iter_type(rule_type).map(|r| (r.key.as_str(), r)).collect()
    }

    /// First rule (table order) whose name matches, ignoring case.
    pub fn get_by_name(&self, name: &str) -> Option<&CategoryRule> {
        let wanted = name.to_lowercase();
        self.rules.iter().find(|r| r.name.to_lowercase() == wanted)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    /// A display name may exist once per type ("Transferências" does).
    pub fn has_category_of_type(&self, name: &str, rule_type: TransactionType) -> bool {
        let wanted = name.to_lowercase();
        self.iter_type(rule_type).any(|r| r.name.to_lowercase() == wanted)
    }

    /// Distinct category names of one type, in table order.
    pub fn category_names(&self, rule_type: TransactionType) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for rule in self.iter_type(rule_type) {
            if !names.contains(&rule.name) {
                names.push(rule.name.clone());
            }
        }
        names
    }

    /// Appends `keyword` to the rule named (or keyed) `category`. Returns
    /// false when no such rule exists or the keyword is already present.
    pub fn add_keyword(&mut self, category: &str, keyword: &str) -> bool {
        let keyword = normalize(keyword);
        if keyword.is_empty() {
            return false;
        }
        let Some(rule) = self.find_mut(category) else {
            return false;
        };
        if rule.keywords.contains(&keyword) {
            return false;
        }
        debug!(rule = %rule.key, %keyword, "keyword added");
        rule.keywords.push(keyword);
        true
    }

    pub fn remove_keyword(&mut self, category: &str, keyword: &str) -> bool {
        let keyword = normalize(keyword);
        let Some(rule) = self.find_mut(category) else {
            return false;
        };
        let before = rule.keywords.len();
        rule.keywords.retain(|k| *k != keyword);
        let removed = rule.keywords.len() != before;
        if removed {
            debug!(rule = %rule.key, %keyword, "keyword removed");
        }
        removed
    }

    fn find_mut(&mut self, category: &str) -> Option<&mut CategoryRule> {
        let wanted = category.to_lowercase();
        let idx = self
            .rules
            .iter()
            .position(|r| r.name.to_lowercase() == wanted)
            .or_else(|| self.rules.iter().position(|r| r.key == category))?;
        self.rules.get_mut(idx)
    }
}

fn dedup_keywords(keywords: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for k in keywords {
        let k = normalize(k);
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

use TransactionType::{Expense, Income};

/// (key, name, type, confidence, priority, keywords)
pub const DEFAULT_RULES: &[(&str, &str, TransactionType, u8, u32, &[&str])] = &[
    // ── Expenses ─────────────────────────────────────────────────────────────
    (
        "alimentacao",
        "Alimentação",
        Expense,
        95,
        2,
        &[
            "supermercado extra",
            "supermercado",
            "mercado",
            "padaria",
            "restaurante",
            "lanchonete",
            "ifood",
            "carrefour",
            "pão de açúcar",
            "assaí",
            "atacadão",
            "açougue",
            "hortifruti",
            "pizzaria",
        ],
    ),
    (
        "transporte",
        "Transporte",
        Expense,
        90,
        2,
        &[
            "uber",
            "99 pop",
            "táxi",
            "taxi",
            "combustível",
            "gasolina",
            "posto",
            "estacionamento",
            "pedágio",
            "metrô",
            "ônibus",
        ],
    ),
    (
        "moradia",
        "Moradia",
        Expense,
        90,
        2,
        &["aluguel", "condomínio", "iptu", "energia elétrica", "conta de luz", "conta de água"],
    ),
    (
        "saude",
        "Saúde",
        Expense,
        90,
        2,
        &[
            "farmácia",
            "drogaria",
            "drogasil",
            "hospital",
            "clínica",
            "médico",
            "dentista",
            "plano de saúde",
            "laboratório",
        ],
    ),
    (
        "educacao",
        "Educação",
        Expense,
        90,
        1,
        &["escola", "faculdade", "universidade", "curso", "livraria", "mensalidade escolar"],
    ),
    (
        "lazer",
        "Lazer",
        Expense,
        85,
        1,
        &["cinema", "netflix", "spotify", "teatro", "ingresso", "viagem", "hotel"],
    ),
    (
        "compras",
        "Compras",
        Expense,
        80,
        1,
        &["loja", "shopping", "amazon", "mercado livre", "magazine luiza", "americanas"],
    ),
    (
        "contas",
        "Contas",
        Expense,
        85,
        1,
        &["boleto", "fatura", "internet", "telefone", "celular", "tv a cabo"],
    ),
    (
        "tarifas",
        "Tarifas Bancárias",
        Expense,
        90,
        1,
        &["tarifa", "anuidade", "iof", "cesta de serviços"],
    ),
    (
        "saques",
        "Saques",
        Expense,
        90,
        1,
        &["saque", "caixa eletrônico"],
    ),
    (
        "transferencias_enviadas",
        "Transferências",
        Expense,
        95,
        2,
        &["pix enviado", "transferência enviada", "ted enviada", "doc enviado"],
    ),
    ("outros_gastos", DEFAULT_EXPENSE_CATEGORY, Expense, DEFAULT_CONFIDENCE, 1, &[]),
    // ── Income ───────────────────────────────────────────────────────────────
    (
        "salario",
        "Salário",
        Income,
        95,
        3,
        &["salário", "salario", "holerite", "folha de pagamento", "adiantamento salarial"],
    ),
    (
        "freelance",
        "Freelance",
        Income,
        85,
        2,
        &["freelance", "freela", "consultoria", "serviço prestado"],
    ),
    (
        "investimentos",
        "Investimentos",
        Income,
        90,
        2,
        &["rendimento", "dividendos", "cdb", "tesouro direto", "resgate", "juros sobre capital"],
    ),
    ("vendas", "Vendas", Income, 85, 1, &["venda", "vendas"]),
    ("depositos", "Depósitos", Income, 90, 1, &["depósito", "deposito"]),
    (
        "transferencias_recebidas",
        "Transferências",
        Income,
        95,
        2,
        &["pix recebido", "transferência recebida", "ted recebida", "doc recebido"],
    ),
    ("reembolsos", "Reembolsos", Income, 85, 1, &["estorno", "reembolso", "cashback"]),
    ("outros_recebimentos", DEFAULT_INCOME_CATEGORY, Income, DEFAULT_CONFIDENCE, 1, &[]),
];
