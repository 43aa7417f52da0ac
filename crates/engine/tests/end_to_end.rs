use chrono::NaiveDate;
use classifica_engine::{
    CategorizationEngine, CategorizeOptions, CorrectionLayer, LearningFeedback, MatchMethod,
    Money, RuleDatabase, TransactionContext, TransactionRecord, TransactionType,
};
use rust_decimal::Decimal;

use TransactionType::{Expense, Income};

fn amount(cents: i64) -> Money {
    Money::from_decimal(Decimal::new(cents, 2))
}

fn record(description: &str, tx_type: TransactionType) -> TransactionRecord {
    TransactionRecord::new(
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        description,
        amount(10000),
        tx_type,
    )
}

#[test]
fn supermarket_is_food_without_warnings() {
    let engine = CategorizationEngine::default();
    let layer = CorrectionLayer::new(&engine);
    let tx = TransactionContext::new("Supermercado Extra", amount(15000), Expense);

    let r = layer.categorize_with_corrections(&tx, None);
    assert_eq!(r.result.category, "Alimentação");
    assert_eq!(r.result.confidence, 95);
    assert!(matches!(r.result.method, MatchMethod::Exact | MatchMethod::Partial));
    assert!(r.validation_warnings.is_empty());
    assert!(r.corrected_type.is_none());
}

#[test]
fn received_pix_declared_as_expense_is_corrected() {
    let engine = CategorizationEngine::default();
    let layer = CorrectionLayer::new(&engine);
    let tx = TransactionContext::new("PIX recebido de Maria", amount(50000), Expense);

    let r = layer.categorize_with_corrections(&tx, None);
    assert_eq!(r.corrected_type, Some(Income));
    assert_eq!(r.result.category, "Transferências");
    assert!(r.result.confidence <= 75);
    assert!(r.result.confidence >= 50);
    assert!(!r.type_correction_reason.unwrap_or_default().is_empty());
}

#[test]
fn unknown_merchant_gets_default() {
    let engine = CategorizationEngine::default();
    let r = engine.categorize(
        &record("xyz987 unknown merchant", Expense),
        &CategorizeOptions::default(),
    );
    assert_eq!(r.category, "Outros Gastos");
    assert_eq!(r.confidence, 50);
    assert_eq!(r.method, MatchMethod::Default);
}

#[test]
fn every_keyword_matches_exactly_at_its_ceiling() {
    let engine = CategorizationEngine::default();
    let rules = RuleDatabase::default();
    let options = CategorizeOptions::default().min_confidence(0);

    for rule in rules.iter() {
        for keyword in &rule.keywords {
            let r = engine.categorize_description(keyword, rule.rule_type, &options);
            // A keyword may be shared by a higher-scoring rule or pattern;
            // whenever this rule wins, it wins exactly.
            if r.category == rule.name && r.method != MatchMethod::Regex {
                assert_eq!(r.method, MatchMethod::Exact, "{keyword}");
                assert_eq!(r.confidence, rule.confidence, "{keyword}");
            }
        }
    }

    let r = engine.categorize_description("NETFLIX", Expense, &options);
    assert_eq!((r.method, r.confidence), (MatchMethod::Exact, 85));
}

#[test]
fn learning_beats_higher_priority_rules() {
    let engine = CategorizationEngine::default();
    engine.learn(LearningFeedback::new("Uber X", "Trabalho"));

    for tx_type in [Income, Expense] {
        let r = engine.categorize(&record("Uber X", tx_type), &CategorizeOptions::default());
        assert_eq!(r.category, "Trabalho");
        assert_eq!(r.confidence, 100);
        assert_eq!(r.method, MatchMethod::Learned);
    }
}

#[test]
fn threshold_discards_weak_match() {
    let engine = CategorizationEngine::default();
    let r = engine.categorize(
        &record("Supermercado Extra", Expense),
        &CategorizeOptions::default().min_confidence(96),
    );
    assert_eq!(r.category, "Outros Gastos");
    assert_eq!(r.confidence, 50);
}

#[test]
fn learning_store_keeps_latest_thousand() {
    let engine = CategorizationEngine::default();
    for i in 0..1050 {
        engine.learn(LearningFeedback::new(&format!("loja-{i:05}"), "Compras"));
    }
    let data = engine.export_learning_data();
    assert_eq!(data.len(), 1000);
    assert_eq!(engine.get_stats().learning_data_count, 1000);
    assert!(data.iter().all(|r| r.description != "loja-00000"));
    assert_eq!(data.first().unwrap().description, "loja-00050");
}

#[test]
fn batch_output_matches_input_positions() {
    let engine = CategorizationEngine::from_toml(
        r#"
        parallel_batch_threshold = 1
        max_workers = 3
        "#,
    )
    .unwrap();
    let txs: Vec<TransactionRecord> = (0..40)
        .map(|i| {
            if i % 2 == 0 {
                record("Uber", Expense)
            } else {
                record("holerite", Income)
            }
        })
        .collect();

    let out = engine.categorize_batch(&txs, &CategorizeOptions::default());
    assert_eq!(out.len(), 40);
    for (i, item) in out.iter().enumerate() {
        let expected = if i % 2 == 0 { "Transporte" } else { "Salário" };
        assert_eq!(item.categorization.category, expected);
        assert_eq!(item.transaction.description, txs[i].description);
    }
}

#[test]
fn income_landing_in_expense_category_is_flagged() {
    let engine = CategorizationEngine::default();
    let layer = CorrectionLayer::new(&engine);
    let tx = TransactionContext::new("Boleto recebido", amount(3000), Income);

    let r = layer.categorize_with_corrections(&tx, None);
    assert_eq!(r.result.category, "Contas");
    assert!(!r.validation_warnings.is_empty());
}

#[test]
fn config_keywords_feed_matching() {
    let engine = CategorizationEngine::from_toml(
        r#"
        [[keywords]]
        category = "Lazer"
        keywords = ["parque aquático"]
        "#,
    )
    .unwrap();
    let r = engine.categorize(&record("Parque Aquático", Expense), &CategorizeOptions::default());
    assert_eq!(r.category, "Lazer");
    assert_eq!(r.method, MatchMethod::Exact);
}
