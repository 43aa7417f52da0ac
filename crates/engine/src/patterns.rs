use std::sync::OnceLock;

use regex::Regex;

/// A compiled pattern bound to a fixed category and confidence. These carry
/// their own semantics and are evaluated against the whole rule table,
/// regardless of the transaction type.
#[derive(Debug)]
pub struct CategoryPattern {
    pub regex: Regex,
    pub category: &'static str,
    pub confidence: u8,
}

// Order matters: candidates are pooled in this order.
const PATTERN_TABLE: &[(&str, &str, u8)] = &[
    (r"(?i)transfer[êe]ncia\s+(recebida|enviada)", "Transferências", 90),
    (r"(?i)sal[áa]rio", "Salário", 95),
    (r"(?i)pix\s+(recebido|enviado)", "Transferências", 95),
    (r"(?i)boleto\s+(pago|recebido)", "Contas", 85),
    (r"(?i)dep[óo]sito", "Depósitos", 90),
    (r"(?i)saque", "Saques", 90),
    (r"(?i)freelance|bico|projeto", "Freelance", 85),
];

pub fn category_patterns() -> &'static [CategoryPattern] {
    static PATTERNS: OnceLock<Vec<CategoryPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        PATTERN_TABLE
            .iter()
            .map(|(pattern, category, confidence)| CategoryPattern {
                regex: Regex::new(pattern).expect("invalid category pattern"),
                category: *category,
                confidence: *confidence,
            })
            .collect()
    })
}
