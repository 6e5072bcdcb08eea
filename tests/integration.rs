//! Black-box integration tests for the full parse → normalize → evaluate
//! pipeline, plus the reference SQL translator.

use serde_json::{json, Value};
use siftql::ast::core::Expr;
use siftql::translate::{SqlTranslator, Translate};
use siftql::{
    build_predicate, compile, evaluate, normalize, parse, CmpOp, ErrorCode, ErrorKind,
    EvalOptions, Literal, NormalizeOptions, Path, Quantifier, SiftError,
};

fn drinks() -> Vec<Value> {
    vec![
        json!({
            "id": 1, "name": "gin", "brand": "Boodles", "category": "Spirits", "year": 1954,
            "ingredients": [{"name": "juniper", "alcohol_content": 40}],
            "tags": ["gin", "citrus"],
        }),
        json!({
            "id": 2, "name": "rum", "brand": "Bacardi", "category": "Spirits", "year": 2000,
            "ingredients": [{"name": "sugar", "alcohol_content": 37}],
            "tags": ["rum"],
        }),
        json!({
            "id": 3, "name": "water", "brand": "Evian", "category": "Drink", "year": 2020,
            "ingredients": [],
            "tags": ["water"],
        }),
    ]
}

fn matching_ids(query: &str) -> Vec<i64> {
    let predicate = compile(query, &NormalizeOptions::new(), EvalOptions::new()).unwrap();
    drinks()
        .iter()
        .filter(|record| predicate.matches(*record).unwrap())
        .map(|record| record["id"].as_i64().unwrap())
        .collect()
}

fn canonical(query: &str) -> Expr {
    let (surface, _) = parse(query).unwrap();
    normalize(&surface, &NormalizeOptions::new()).unwrap()
}

// ============ End-to-end scenarios ============

#[test]
fn scenario_shorthand_and_comparison() {
    assert_eq!(matching_ids(r#"category: "Spirits" AND year > 1990"#), [2]);
}

#[test]
fn scenario_array_shorthand() {
    assert_eq!(matching_ids("ingredients.alcohol_content > 38"), [1]);
}

#[test]
fn scenario_negated_quantifier() {
    assert_eq!(matching_ids(r#"NOT any(ingredients, name: "juniper")"#), [2, 3]);
}

#[test]
fn scenario_grouping_and_negated_text() {
    assert_eq!(
        matching_ids(r#"(category: "Spirits" AND year > 1990) OR NOT (name: "water")"#),
        [1, 2]
    );
}

#[test]
fn scenario_value_segment_over_primitive_sequences() {
    assert_eq!(
        matching_ids(r#"any(tags, value: "gin") AND NOT any(tags, value: "water")"#),
        [1]
    );
}

#[test]
fn scenario_all_requires_a_non_empty_sequence() {
    // id 3 fails because its ingredients sequence is empty
    assert_eq!(matching_ids("all(ingredients, alcohol_content >= 0)"), [1, 2]);
}

// ============ Boundary behaviors ============

#[test]
fn empty_sequence_quantifier_results() {
    let record = json!({"items": []});
    let options = EvalOptions::new();
    for (query, expected) in [
        ("any(items, value > 0)", false),
        ("all(items, value > 0)", false),
        ("none(items, value > 0)", true),
    ] {
        let tree = canonical(query);
        assert_eq!(
            evaluate(&tree, &record, &options).unwrap(),
            expected,
            "query: {query}"
        );
    }
}

#[test]
fn absent_field_under_text_is_false_not_an_error() {
    let tree = canonical(r#"nickname: "x""#);
    assert!(!evaluate(&tree, &json!({}), &EvalOptions::new()).unwrap());
}

#[test]
fn absent_field_under_numeric_comparison_is_a_type_mismatch() {
    let tree = canonical("missing > 10");
    let err = evaluate(&tree, &json!({}), &EvalOptions::new()).unwrap_err();
    assert_eq!(err.code, ErrorCode::EvalTypeMismatch);
    assert_eq!(
        err.message,
        "Type mismatch for 'gt': expected number|string, got null/number."
    );
}

#[test]
fn empty_needle_matches_any_present_string() {
    let tree = canonical(r#"contains(name, "")"#);
    assert!(evaluate(&tree, &json!({"name": "gin"}), &EvalOptions::new()).unwrap());
    assert!(!evaluate(&tree, &json!({}), &EvalOptions::new()).unwrap());
}

#[test]
fn deeply_nested_chains_flatten_to_one_node() {
    let tree = canonical("a AND (b AND (c AND (d AND e)))");
    let Expr::And(children) = tree else {
        panic!("expected And");
    };
    assert_eq!(children.len(), 5);
    assert!(children
        .iter()
        .all(|child| matches!(child, Expr::Comparison { .. })));
}

#[test]
fn singleton_value_list_collapses_to_a_leaf() {
    let tree = canonical(r#"name: ("gin")"#);
    assert!(matches!(tree, Expr::Text { .. }));
}

#[test]
fn three_segment_path_produces_two_quantifier_layers() {
    let tree = canonical("a.b.c = 1");
    let Expr::Quantified {
        quantifier: Quantifier::Any,
        path,
        predicate,
    } = tree
    else {
        panic!("expected outer quantifier");
    };
    assert_eq!(path, Path::single("a"));
    let Expr::Quantified {
        quantifier: Quantifier::Any,
        path,
        predicate,
    } = *predicate
    else {
        panic!("expected inner quantifier");
    };
    assert_eq!(path, Path::single("b"));
    assert_eq!(
        *predicate,
        Expr::Comparison {
            path: Path::single("c"),
            op: CmpOp::Eq,
            value: Literal::Num(1.0),
        }
    );
}

// ============ Targeted normalization shapes ============

#[test]
fn negated_comparison_normalizes_without_a_not_node() {
    assert_eq!(
        canonical("NOT (price > 10)"),
        Expr::Comparison {
            path: Path::single("price"),
            op: CmpOp::Lte,
            value: Literal::Num(10.0),
        }
    );
}

#[test]
fn negated_conjunction_of_truthy_paths() {
    assert_eq!(
        canonical("NOT (a AND b)"),
        Expr::Or(vec![
            Expr::Comparison {
                path: Path::single("a"),
                op: CmpOp::Eq,
                value: Literal::Null,
            },
            Expr::Comparison {
                path: Path::single("b"),
                op: CmpOp::Eq,
                value: Literal::Null,
            },
        ])
    );
}

#[test]
fn comparison_list_on_array_path_lifts_each_leaf() {
    let tree = canonical("ingredients.alcohol_content: (>5, <=13)");
    let Expr::And(children) = tree else {
        panic!("expected And");
    };
    assert_eq!(children.len(), 2);
    for child in &children {
        assert!(
            matches!(
                child,
                Expr::Quantified {
                    quantifier: Quantifier::Any,
                    path,
                    ..
                } if *path == Path::single("ingredients")
            ),
            "child: {child:?}"
        );
    }
}

#[test]
fn folding_and_case_options_match_accented_and_upper_case() {
    let options = EvalOptions::new()
        .with_fold_diacritics(true)
        .with_ignore_case(true);
    let predicate = build_predicate(canonical(r#"name: "cafe""#), options);
    assert!(predicate.matches(&json!({"name": "Café au lait"})).unwrap());
    assert!(predicate.matches(&json!({"name": "CAFETERIA"})).unwrap());
    assert!(!predicate.matches(&json!({"name": "tea"})).unwrap());
}

#[test]
fn turkish_locale_steers_case_folding() {
    // The crate implements the tr/az mapping itself, so the behavior is
    // deterministic across runtimes
    let options = EvalOptions::new().with_ignore_case(true).with_locale("tr");
    let predicate = build_predicate(canonical(r#"city: "ı""#), options);
    assert!(predicate.matches(&json!({"city": "DIYARBAKIR"})).unwrap());

    let options = EvalOptions::new().with_ignore_case(true).with_locale("en");
    let predicate = build_predicate(canonical(r#"city: "ı""#), options);
    assert!(!predicate.matches(&json!({"city": "DIYARBAKIR"})).unwrap());
}

// ============ Error taxonomy across stages ============

#[test]
fn each_stage_reports_its_kind_and_code() {
    let parse_err = compile("year >", &NormalizeOptions::new(), EvalOptions::new()).unwrap_err();
    assert_eq!(parse_err.kind(), ErrorKind::Parse);
    assert_eq!(parse_err.code(), ErrorCode::ParseGeneric);

    let lex_err = compile("year ~ 1", &NormalizeOptions::new(), EvalOptions::new()).unwrap_err();
    assert_eq!(lex_err.code(), ErrorCode::ParseUnexpectedToken);

    let norm_err = compile("flag: true", &NormalizeOptions::new(), EvalOptions::new()).unwrap_err();
    assert_eq!(norm_err.kind(), ErrorKind::Normalize);
    assert_eq!(norm_err.code(), ErrorCode::NormalizeUnsupportedNode);

    let eval_err: SiftError = evaluate(
        &canonical("name > 1"),
        &json!({"name": "gin"}),
        &EvalOptions::new(),
    )
    .unwrap_err()
    .into();
    assert_eq!(eval_err.kind(), ErrorKind::Evaluation);

    let adapter_err: SiftError = SqlTranslator::new()
        .translate(&canonical(r#"any(tags, value: "gin")"#))
        .unwrap_err()
        .into();
    assert_eq!(adapter_err.kind(), ErrorKind::Translator);
    assert_eq!(adapter_err.code(), ErrorCode::AdapterUnsupportedFeature);
}

#[test]
fn parse_error_pinpoints_the_offending_lexeme() {
    let err = parse("name AND OR").unwrap_err();
    assert_eq!(err.code, ErrorCode::ParseGeneric);
    assert_eq!((err.line, err.column), (Some(1), Some(10)));
    assert_eq!(err.lexeme.as_deref(), Some("OR"));
    assert!(err.message.starts_with("Unexpected token 'OR' at 1:10"));
}

// ============ Text-search targets ============

#[test]
fn single_argument_text_functions_search_configured_targets() {
    let options = NormalizeOptions::new().with_target("name").with_target("brand");
    let predicate = compile(r#"contains("bood")"#, &options, EvalOptions::new()).unwrap();
    let ids: Vec<i64> = drinks()
        .iter()
        .filter(|record| predicate.matches(*record).unwrap())
        .map(|record| record["id"].as_i64().unwrap())
        .collect();
    assert!(ids.is_empty());

    let options = NormalizeOptions::new().with_target("name").with_target("brand");
    let predicate = compile(
        r#"contains("Bood")"#,
        &options,
        EvalOptions::new().with_ignore_case(true),
    )
    .unwrap();
    let ids: Vec<i64> = drinks()
        .iter()
        .filter(|record| predicate.matches(*record).unwrap())
        .map(|record| record["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [1]);
}

#[test]
fn unconfigured_targets_are_a_normalize_error() {
    let err = compile(r#"contains("gin")"#, &NormalizeOptions::new(), EvalOptions::new())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NormalizeGeneric);
}

// ============ Translator over pipeline output ============

#[test]
fn sql_translation_of_a_pipeline_query() {
    let sql = SqlTranslator::new()
        .translate(&canonical(r#"category: "Spirits" AND year > 1990"#))
        .unwrap();
    assert_eq!(
        sql,
        r#"("category" LIKE '%Spirits%' ESCAPE '\' AND "year" > 1990)"#
    );
}

// ============ Pipeline purity ============

#[test]
fn normalization_does_not_mutate_the_surface_tree() {
    let (surface, _) = parse(r#"NOT (a AND name: "x")"#).unwrap();
    let before = surface.clone();
    let _ = normalize(&surface, &NormalizeOptions::new()).unwrap();
    assert_eq!(surface, before);
}

#[test]
fn predicates_are_reusable_and_deterministic() {
    let predicate = compile(
        "year >= 1990",
        &NormalizeOptions::new(),
        EvalOptions::new(),
    )
    .unwrap();
    let record = json!({"year": 2000});
    for _ in 0..3 {
        assert!(predicate.matches(&record).unwrap());
    }
}
