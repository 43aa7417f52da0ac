use std::collections::HashSet;

use classifica_core::TransactionType;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::patterns::category_patterns;
use crate::rules::{CategoryRule, RuleDatabase};
use crate::util::{char_len, normalize, similarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Partial,
    Fuzzy,
    Regex,
    Learned,
    Default,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Partial => write!(f, "partial"),
            MatchMethod::Fuzzy => write!(f, "fuzzy"),
            MatchMethod::Regex => write!(f, "regex"),
            MatchMethod::Learned => write!(f, "learned"),
            MatchMethod::Default => write!(f, "default"),
        }
    }
}

impl std::str::FromStr for MatchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchMethod::Exact),
            "partial" => Ok(MatchMethod::Partial),
            "fuzzy" => Ok(MatchMethod::Fuzzy),
            "regex" => Ok(MatchMethod::Regex),
            "learned" => Ok(MatchMethod::Learned),
            "default" => Ok(MatchMethod::Default),
            other => Err(format!("Unknown match method: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub category: String,
    /// 0–100.
    pub confidence: u8,
    pub method: MatchMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizationResult {
    pub category: String,
    pub confidence: u8,
    pub method: MatchMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<MatchCandidate>,
}

impl CategorizationResult {
    pub fn new(category: &str, confidence: u8, method: MatchMethod) -> Self {
        CategorizationResult {
            category: category.to_string(),
            confidence: confidence.min(100),
            method,
            matched_keyword: None,
            alternatives: Vec::new(),
        }
    }

    /// Fallback assignments are worth a second look from the user.
    pub fn needs_review(&self) -> bool {
        self.method == MatchMethod::Default
    }
}

/// A pooled candidate together with the priority used to rank it.
#[derive(Debug, Clone)]
struct Scored {
    candidate: MatchCandidate,
    priority: u32,
}

impl Scored {
    fn score(&self) -> u32 {
        u32::from(self.candidate.confidence) * self.priority
    }
}

/// Runs the exact, partial, fuzzy and regex strategies over a rule table
/// and ranks what they find.
#[derive(Debug, Clone)]
pub struct Matcher {
    /// Minimum confidence for a substring hit.
    pub partial_threshold: u8,
    /// Minimum whole-string similarity for a fuzzy hit.
    pub fuzzy_threshold: f64,
    pub max_alternatives: usize,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            partial_threshold: 60,
            fuzzy_threshold: 0.70,
            max_alternatives: 3,
        }
    }
}

impl Matcher {
    pub fn new(partial_threshold: u8, fuzzy_threshold: f64, max_alternatives: usize) -> Self {
        Self {
            partial_threshold,
            fuzzy_threshold,
            max_alternatives,
        }
    }

    /// Best candidate for `description` among rules of `tx_type`, optionally
    /// restricted to the category names in `available`. `None` when no
    /// strategy produced anything.
    pub fn match_description(
        &self,
        rules: &RuleDatabase,
        description: &str,
        tx_type: TransactionType,
        available: Option<&HashSet<String>>,
    ) -> Option<CategorizationResult> {
        let text = normalize(description);
        if text.is_empty() {
            return None;
        }

        let available: Option<HashSet<String>> =
            available.map(|names| names.iter().map(|n| n.to_lowercase()).collect());
        let allowed = |name: &str| {
            available
                .as_ref()
                .map_or(true, |names| names.contains(&name.to_lowercase()))
        };

        let candidates: Vec<&CategoryRule> = rules
            .iter_type(tx_type)
            .filter(|r| allowed(r.name.as_str()))
            .collect();

        // Pool order is exact, partial, fuzzy, regex: the stable sort below
        // keeps that order between equal scores.
        let mut pool: Vec<Scored> = Vec::new();
        self.exact(&candidates, &text, &mut pool);
        self.partial(&candidates, &text, &mut pool);
        self.fuzzy(&candidates, &description.to_lowercase(), &mut pool);
        self.regex(rules, description, tx_type, &allowed, &mut pool);

        trace!(description, candidates = pool.len(), "matcher pool built");

        pool.sort_by(|a, b| b.score().cmp(&a.score()));
        let mut ranked = pool.into_iter().map(|s| s.candidate);
        let best = ranked.next()?;

        let mut alternatives: Vec<MatchCandidate> = Vec::new();
        for candidate in ranked {
            if alternatives.len() >= self.max_alternatives {
                break;
            }
            if candidate.category == best.category
                || alternatives.iter().any(|a| a.category == candidate.category)
            {
                continue;
            }
            alternatives.push(candidate);
        }

        Some(CategorizationResult {
            category: best.category,
            confidence: best.confidence,
            method: best.method,
            matched_keyword: best.matched_keyword,
            alternatives,
        })
    }

    fn exact(&self, rules: &[&CategoryRule], text: &str, pool: &mut Vec<Scored>) {
        for rule in rules {
            if let Some(keyword) = rule.keywords.iter().find(|k| k.as_str() == text) {
                pool.push(scored(rule, rule.confidence, MatchMethod::Exact, keyword));
            }
        }
    }

    fn partial(&self, rules: &[&CategoryRule], text: &str, pool: &mut Vec<Scored>) {
        let text_len = char_len(text) as f64;
        for rule in rules {
            for keyword in rule.keywords.iter().filter(|k| text.contains(k.as_str())) {
                let ratio = (char_len(keyword) as f64 / text_len * 100.0).round();
                let confidence = (ratio.min(100.0) as u8).min(rule.confidence);
                if confidence >= self.partial_threshold {
                    pool.push(scored(rule, confidence, MatchMethod::Partial, keyword));
                }
            }
        }
    }

    fn fuzzy(&self, rules: &[&CategoryRule], text: &str, pool: &mut Vec<Scored>) {
        for rule in rules {
            for keyword in &rule.keywords {
                let sim = similarity(text, keyword);
                if sim >= self.fuzzy_threshold {
                    let confidence = (sim * f64::from(rule.confidence)).round() as u8;
                    pool.push(scored(rule, confidence, MatchMethod::Fuzzy, keyword));
                }
            }
        }
    }

    fn regex(
        &self,
        rules: &RuleDatabase,
        description: &str,
        tx_type: TransactionType,
        allowed: &dyn Fn(&str) -> bool,
        pool: &mut Vec<Scored>,
    ) {
        for pattern in category_patterns() {
            if !allowed(pattern.category) {
                continue;
            }
            let Some(found) = pattern.regex.find(description) else {
                continue;
            };
            // Prefer the rule of the transaction's own type when a name is
            // shared; categories without a rule rank with priority 1.
            let priority = rules
                .iter_type(tx_type)
                .find(|r| r.name == pattern.category)
                .or_else(|| rules.get_by_name(pattern.category))
                .map_or(1, |r| r.priority);
            pool.push(Scored {
                candidate: MatchCandidate {
                    category: pattern.category.to_string(),
                    confidence: pattern.confidence,
                    method: MatchMethod::Regex,
                    matched_keyword: Some(found.as_str().to_lowercase()),
                },
                priority,
            });
        }
    }
}

fn scored(rule: &CategoryRule, confidence: u8, method: MatchMethod, keyword: &str) -> Scored {
    Scored {
        candidate: MatchCandidate {
            category: rule.name.clone(),
            confidence: confidence.min(rule.confidence),
            method,
            matched_keyword: Some(keyword.to_string()),
        },
        priority: rule.priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classifica_core::TransactionType::{Expense, Income};

    fn make_rule(key: &str, keywords: &[&str], confidence: u8, priority: u32) -> CategoryRule {
        CategoryRule::new(key, key, Expense, keywords, confidence, priority)
    }

    fn db(rules: Vec<CategoryRule>) -> RuleDatabase {
        RuleDatabase::new(rules).unwrap()
    }

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_reports_rule_ceiling() {
        let rules = db(vec![make_rule("Lazer", &["cinemark"], 85, 1)]);
        let r = Matcher::default()
            .match_description(&rules, "  CINEMARK ", Expense, None)
            .unwrap();
        assert_eq!(r.category, "Lazer");
        assert_eq!(r.confidence, 85);
        assert_eq!(r.method, MatchMethod::Exact);
        assert_eq!(r.matched_keyword.as_deref(), Some("cinemark"));
    }

    #[test]
    fn partial_confidence_is_length_ratio() {
        let rules = db(vec![make_rule("Saúde", &["farmacia"], 90, 1)]);
        let r = Matcher::default()
            .match_description(&rules, "Farmacia SP", Expense, None)
            .unwrap();
        // 8 / 11 * 100 = 72.7
        assert_eq!(r.method, MatchMethod::Partial);
        assert_eq!(r.confidence, 73);
    }

    #[test]
    fn partial_confidence_is_capped_by_ceiling() {
        let rules = db(vec![make_rule("Lazer", &["netflix"], 80, 1)]);
        let r = Matcher::default()
            .match_description(&rules, "netflix!", Expense, None)
            .unwrap();
        assert_eq!(r.method, MatchMethod::Partial);
        assert_eq!(r.confidence, 80);
        // fuzzy 7/8 * 80 = 70 trails as the same category, not an alternative
        assert!(r.alternatives.is_empty());
    }

    #[test]
    fn short_keyword_in_long_description_is_rejected() {
        let rules = db(vec![make_rule("Saúde", &["farmacia"], 90, 1)]);
        let r = Matcher::default().match_description(
            &rules,
            "farmacia pague menos centro",
            Expense,
            None,
        );
        assert!(r.is_none());
    }

    #[test]
    fn fuzzy_match_scales_ceiling_by_similarity() {
        let rules = db(vec![make_rule("Saúde", &["drogaria"], 90, 1)]);
        let r = Matcher::default()
            .match_description(&rules, "drogria", Expense, None)
            .unwrap();
        // similarity 7/8 = 0.875, 0.875 * 90 = 78.75
        assert_eq!(r.method, MatchMethod::Fuzzy);
        assert_eq!(r.confidence, 79);
    }

    #[test]
    fn fuzzy_compares_whole_untrimmed_description() {
        let rules = db(vec![make_rule("Saúde", &["drogaria"], 90, 1)]);
        // Trailing spaces count against similarity: at best 7 / 12 < 0.70.
        let r = Matcher::default().match_description(&rules, "drogria     ", Expense, None);
        assert!(r.is_none());
    }

    #[test]
    fn regex_ignores_type_filter() {
        let rules = RuleDatabase::default();
        let r = Matcher::default()
            .match_description(&rules, "Salário", Expense, None)
            .unwrap();
        assert_eq!(r.category, "Salário");
        assert_eq!(r.method, MatchMethod::Regex);
        assert_eq!(r.confidence, 95);
    }

    #[test]
    fn regex_respects_available_categories() {
        let rules = RuleDatabase::default();
        let only_food = names(&["Alimentação"]);
        assert!(Matcher::default()
            .match_description(&rules, "Salário", Expense, Some(&only_food))
            .is_none());
    }

    #[test]
    fn type_filter_excludes_other_type() {
        let rules = RuleDatabase::default();
        let r = Matcher::default().match_description(&rules, "holerite", Expense, None);
        assert!(r.is_none());
        let r = Matcher::default()
            .match_description(&rules, "holerite", Income, None)
            .unwrap();
        assert_eq!(r.category, "Salário");
    }

    #[test]
    fn available_categories_restrict_rules() {
        let rules = RuleDatabase::default();
        let matcher = Matcher::default();
        assert!(matcher
            .match_description(&rules, "uber", Expense, Some(&names(&["Alimentação"])))
            .is_none());
        let r = matcher
            .match_description(&rules, "uber", Expense, Some(&names(&["transporte"])))
            .unwrap();
        assert_eq!(r.category, "Transporte");
    }

    #[test]
    fn priority_multiplies_confidence() {
        let rules = db(vec![
            make_rule("Alta", &["abc"], 90, 1),
            make_rule("Baixa", &["abc"], 50, 2),
        ]);
        let r = Matcher::default()
            .match_description(&rules, "abc", Expense, None)
            .unwrap();
        // 50 * 2 = 100 beats 90 * 1
        assert_eq!(r.category, "Baixa");
        assert_eq!(r.confidence, 50);
        assert_eq!(r.alternatives[0].category, "Alta");
    }

    #[test]
    fn equal_scores_keep_discovery_order() {
        let rules = db(vec![
            make_rule("Primeira", &["abc"], 90, 1),
            make_rule("Segunda", &["abc"], 90, 1),
        ]);
        let r = Matcher::default()
            .match_description(&rules, "abc", Expense, None)
            .unwrap();
        assert_eq!(r.category, "Primeira");
        assert_eq!(r.method, MatchMethod::Exact);
    }

    #[test]
    fn alternatives_are_distinct_and_bounded() {
        let rules = db(vec![
            make_rule("A", &["loja"], 95, 1),
            make_rule("B", &["loja"], 90, 1),
            make_rule("C", &["loja"], 85, 1),
            make_rule("D", &["loja"], 80, 1),
            make_rule("E", &["loja"], 75, 1),
        ]);
        let r = Matcher::default()
            .match_description(&rules, "loja", Expense, None)
            .unwrap();
        assert_eq!(r.category, "A");
        let alt: Vec<&str> = r.alternatives.iter().map(|a| a.category.as_str()).collect();
        assert_eq!(alt, vec!["B", "C", "D"]);
    }

    #[test]
    fn empty_description_yields_nothing() {
        let rules = RuleDatabase::default();
        assert!(Matcher::default()
            .match_description(&rules, "   ", Expense, None)
            .is_none());
    }

    #[test]
    fn rule_without_keywords_contributes_nothing() {
        let rules = db(vec![make_rule("Vazio", &[], 90, 1)]);
        assert!(Matcher::default()
            .match_description(&rules, "qualquer coisa", Expense, None)
            .is_none());
    }

    #[test]
    fn no_candidate_exceeds_rule_ceiling() {
        let rules = RuleDatabase::default();
        let matcher = Matcher::default();
        for description in ["uber", "ifood", "drogaria sp", "farmacia", "supermercado extra"] {
            let r = matcher
                .match_description(&rules, description, Expense, None)
                .unwrap();
            let ceiling = rules.get_by_name(&r.category).unwrap().confidence;
            assert!(r.confidence <= ceiling, "{description}: {}", r.confidence);
            for alt in &r.alternatives {
                let ceiling = rules.get_by_name(&alt.category).unwrap().confidence;
                assert!(alt.confidence <= ceiling);
            }
        }
    }

    #[test]
    fn match_method_roundtrip() {
        use std::str::FromStr;
        for m in [MatchMethod::Exact, MatchMethod::Learned, MatchMethod::Default] {
            assert_eq!(MatchMethod::from_str(&m.to_string()).unwrap(), m);
        }
        assert_eq!(serde_json::to_string(&MatchMethod::Fuzzy).unwrap(), "\"fuzzy\"");
    }
}
