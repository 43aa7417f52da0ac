use classifica_core::{TransactionContext, TransactionType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{CategorizationEngine, CategorizeOptions};
use crate::matcher::CategorizationResult;
use crate::rules::DEFAULT_CONFIDENCE;

use TransactionType::{Expense, Income};

/// Confidence removed from a result whose type was overridden.
pub const CORRECTION_PENALTY: u8 = 20;

/// Phrase → type, evaluated top to bottom; the first hit decides.
pub const TYPE_LEXICON: &[(&str, TransactionType)] = &[
    ("compra no", Expense),
    ("compra na", Expense),
    ("compra em", Expense),
    ("pagamento de boleto", Expense),
    ("pagamento efetuado", Expense),
    ("pix enviado", Expense),
    ("pix recebido", Income),
    ("transferência enviada", Expense),
    ("transferencia enviada", Expense),
    ("transferência recebida", Income),
    ("transferencia recebida", Income),
    ("ted enviada", Expense),
    ("ted recebida", Income),
    ("salário", Income),
    ("salario", Income),
    ("depósito recebido", Income),
    ("estorno de", Income),
    ("saque no", Expense),
    ("tarifa de", Expense),
    ("débito automático", Expense),
    ("rendimento de", Income),
];

pub const EXPENSE_INDICATORS: &[&str] = &[
    "compra",
    "pagamento",
    "débito",
    "debito",
    "saque",
    "taxa",
    "tarifa",
    "fatura",
    "aluguel",
    "financiamento",
    "prestação",
    "parcela",
    "anuidade",
];

pub const INCOME_INDICATORS: &[&str] = &[
    "recebimento",
    "crédito",
    "credito",
    "depósito",
    "deposito",
    "salário",
    "estorno",
    "rendimento",
    "juros",
    "freelance",
    "venda",
    "reembolso",
    "dividendo",
];

/// Checked last, after both indicator lists.
pub const DIRECTIONAL_PHRASES: &[(&str, TransactionType)] = &[
    ("pix para", Expense),
    ("pix de", Income),
    ("transferência para", Expense),
    ("transferencia para", Expense),
    ("transferência de", Income),
    ("transferencia de", Income),
];

/// Words that make an income line suspicious.
const INCOME_SUSPECT_WORDS: &[&str] = &["recebido", "depósito"];
/// Words that make an expense line suspicious.
const EXPENSE_SUSPECT_WORDS: &[&str] = &["pagamento", "débito", "saque"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCorrection {
    pub corrected_type: TransactionType,
    pub reason: String,
}

/// Infers a transaction's direction from lexical cues in its description.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCorrector;

impl TypeCorrector {
    /// The type the description points to and the phrase that decided it.
    pub fn detect(&self, description: &str) -> Option<(TransactionType, &'static str)> {
        let text = description.to_lowercase();

        if let Some((phrase, tx_type)) = TYPE_LEXICON.iter().find(|(p, _)| text.contains(p)) {
            return Some((*tx_type, *phrase));
        }
        if let Some(word) = EXPENSE_INDICATORS.iter().find(|w| text.contains(*w)) {
            return Some((Expense, *word));
        }
        if let Some(word) = INCOME_INDICATORS.iter().find(|w| text.contains(*w)) {
            return Some((Income, *word));
        }
        DIRECTIONAL_PHRASES
            .iter()
            .find(|(p, _)| text.contains(p))
            .map(|(phrase, tx_type)| (*tx_type, *phrase))
    }

    /// A correction only when the detected type differs from `declared`.
    pub fn correct(&self, description: &str, declared: TransactionType) -> Option<TypeCorrection> {
        let (detected, phrase) = self.detect(description)?;
        (detected != declared).then(|| TypeCorrection {
            corrected_type: detected,
            reason: format!(
                "Descrição contém \"{phrase}\", típico de {}; tipo declarado era {}",
                detected.label_pt(),
                declared.label_pt()
            ),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedCategorizationResult {
    #[serde(flatten)]
    pub result: CategorizationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_correction_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_warnings: Vec<String>,
}

impl ImprovedCategorizationResult {
    pub fn needs_review(&self) -> bool {
        self.result.needs_review() || !self.validation_warnings.is_empty()
    }
}

/// Runs a type sanity check before categorizing and flags results whose
/// category disagrees with the transaction's direction. Stateless per call.
pub struct CorrectionLayer<'e> {
    engine: &'e CategorizationEngine,
    corrector: TypeCorrector,
}

impl<'e> CorrectionLayer<'e> {
    pub fn new(engine: &'e CategorizationEngine) -> Self {
        Self {
            engine,
            corrector: TypeCorrector,
        }
    }

    pub fn categorize_with_corrections(
        &self,
        tx: &TransactionContext,
        available_categories: Option<&[String]>,
    ) -> ImprovedCategorizationResult {
        let correction = self.corrector.correct(&tx.description, tx.original_type);
        let tx_type = correction
            .as_ref()
            .map_or(tx.original_type, |c| c.corrected_type);
        if let Some(c) = &correction {
            debug!(description = %tx.description, corrected = %c.corrected_type, "type corrected");
        }

        let options = CategorizeOptions {
            available_categories: available_categories.map(<[String]>::to_vec),
            ..CategorizeOptions::default()
        };
        let mut result = self
            .engine
            .categorize_description(&tx.description, tx_type, &options);

        if correction.is_some() {
            result.confidence = penalize(result.confidence);
        }

        let validation_warnings = self.validate(&tx.description, tx_type, &result);

        ImprovedCategorizationResult {
            result,
            corrected_type: correction.as_ref().map(|c| c.corrected_type),
            type_correction_reason: correction.map(|c| c.reason),
            validation_warnings,
        }
    }

    fn validate(
        &self,
        description: &str,
        tx_type: TransactionType,
        result: &CategorizationResult,
    ) -> Vec<String> {
        let mut warnings = Vec::new();
        let rules = self.engine.rules_snapshot();

        if let Some(rule) = rules.get_by_name(&result.category) {
            if !rules.has_category_of_type(&result.category, tx_type) {
                warnings.push(format!(
                    "Categoria \"{}\" é de {}, mas a transação é {}",
                    result.category,
                    rule.rule_type.label_pt(),
                    tx_type.label_pt()
                ));
            }
        }

        let text = description.to_lowercase();
        let suspects = match tx_type {
            Income => INCOME_SUSPECT_WORDS,
            Expense => EXPENSE_SUSPECT_WORDS,
        };
        if let Some(word) = suspects.iter().find(|w| text.contains(*w)) {
            warnings.push(format!(
                "Transação de {} com \"{word}\" na descrição; confirme o tipo",
                tx_type.label_pt()
            ));
        }

        warnings
    }
}

/// Lowers confidence by the penalty without dropping below the default
/// category's confidence; values already at or below it are left alone.
fn penalize(confidence: u8) -> u8 {
    if confidence <= DEFAULT_CONFIDENCE {
        confidence
    } else {
        confidence.saturating_sub(CORRECTION_PENALTY).max(DEFAULT_CONFIDENCE)
    }
}
