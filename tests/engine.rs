mod common;

use std::fs;

use common::TestWorkspace;
use csv_schema_audit::{
    config::AuditConfig,
    consistency::ConsistencyReport,
    encoding::FixedGuesser,
    engine::{OutputPaths, SchemaInferenceEngine},
    error::AuditError,
    schema::{ColumnType, Schema},
};

fn engine(config: AuditConfig) -> SchemaInferenceEngine {
    SchemaInferenceEngine::new(config)
        .expect("valid config")
        .with_guesser(Box::new(FixedGuesser::new("utf-8", 0.99)))
}

fn types(schema: &Schema) -> Vec<ColumnType> {
    schema.columns.iter().map(|c| c.inferred_type).collect()
}

#[test]
fn numeric_and_date_columns_are_typed() {
    let ws = TestWorkspace::new();
    let csv = ws.write(
        "orders.csv",
        "id,amount,created_at\n1,10.5,2024-01-01\n2,20,2024-01-02\n",
    );
    let outcome = engine(ws.config()).infer(&csv, None).unwrap();

    assert_eq!(
        types(&outcome.schema),
        vec![ColumnType::Int, ColumnType::Float, ColumnType::Date]
    );
    assert_eq!(outcome.row_count, 2);
    for column in &outcome.consistency.columns {
        assert_eq!(column.match_ratio, 1.0, "{}", column.column_name);
        assert!(column.mismatches.is_empty());
    }
}

#[test]
fn boolean_words_win_over_strings() {
    let ws = TestWorkspace::new();
    let csv = ws.write("flags.csv", "flag\ntrue\nfalse\ntrue\n");
    let outcome = engine(ws.config()).infer(&csv, None).unwrap();
    assert_eq!(types(&outcome.schema), vec![ColumnType::Boolean]);
    assert_eq!(outcome.consistency.columns[0].match_ratio, 1.0);
}

#[test]
fn zero_one_column_stays_integer() {
    let ws = TestWorkspace::new();
    let csv = ws.write("bits.csv", "bit\n0\n1\n1\n0\n");
    let outcome = engine(ws.config()).infer(&csv, None).unwrap();
    assert_eq!(types(&outcome.schema), vec![ColumnType::Int]);
}

#[test]
fn mixed_column_falls_back_to_string() {
    let ws = TestWorkspace::new();
    let csv = ws.write("mixed.csv", "mixed\n5\n5\nabc\n");
    let outcome = engine(ws.config()).infer(&csv, None).unwrap();
    assert_eq!(types(&outcome.schema), vec![ColumnType::Str]);
    assert_eq!(outcome.consistency.columns[0].match_ratio, 1.0);
    assert_eq!(outcome.consistency.columns[0].mismatch_count, 0);
}

#[test]
fn timestamps_are_detected() {
    let ws = TestWorkspace::new();
    let csv = ws.write("ts.csv", "ts\n2024-01-01 10:00:00\n2024-01-02 11:30:00\n");
    let outcome = engine(ws.config()).infer(&csv, None).unwrap();
    assert_eq!(types(&outcome.schema), vec![ColumnType::Timestamp]);
}

#[test]
fn single_outlier_in_hundred_keeps_integer_and_is_reported() {
    let ws = TestWorkspace::new();
    let mut contents = String::from("qty\n");
    for i in 1..=99 {
        contents.push_str(&format!("{i}\n"));
    }
    contents.push_str("n/a\n");
    let csv = ws.write("qty.csv", &contents);
    let outcome = engine(ws.config()).infer(&csv, None).unwrap();

    assert_eq!(types(&outcome.schema), vec![ColumnType::Int]);
    let column = &outcome.consistency.columns[0];
    assert!((column.match_ratio - 0.99).abs() < 1e-9);
    assert_eq!(column.mismatch_count, 1);
    assert_eq!(column.mismatches[0].row_index, 100);
    assert_eq!(column.mismatches[0].raw_value, "n/a");
}

#[test]
fn strict_acceptance_demotes_outliers_to_string() {
    let ws = TestWorkspace::new();
    let mut contents = String::from("qty\n");
    for i in 1..=99 {
        contents.push_str(&format!("{i}\n"));
    }
    contents.push_str("n/a\n");
    let csv = ws.write("qty.csv", &contents);
    let config = AuditConfig {
        acceptance_ratio: 1.0,
        ..ws.config()
    };
    let outcome = engine(config).infer(&csv, None).unwrap();
    assert_eq!(types(&outcome.schema), vec![ColumnType::Str]);
    assert_eq!(outcome.consistency.columns[0].mismatch_count, 0);
}

#[test]
fn empty_column_is_string_and_fully_consistent() {
    let ws = TestWorkspace::new();
    let csv = ws.write("notes.csv", "id,note\n1,\n2,\n");
    let outcome = engine(ws.config()).infer(&csv, None).unwrap();
    assert_eq!(types(&outcome.schema), vec![ColumnType::Int, ColumnType::Str]);
    let note = &outcome.consistency.columns[1];
    assert_eq!(note.match_ratio, 1.0);
    assert_eq!(note.non_empty_count, 0);
    assert_eq!(note.empty_count, 2);
}

#[test]
fn header_only_file_yields_string_schema_and_empty_report() {
    let ws = TestWorkspace::new();
    let csv = ws.write("empty.csv", "id,name,amount\n");
    let config = ws.config();
    let outputs = OutputPaths::for_input(&config, &csv);
    let outcome = engine(config).run(&csv, None, &outputs).unwrap();

    assert_eq!(outcome.schema.len(), 3);
    assert!(
        outcome
            .schema
            .columns
            .iter()
            .all(|c| c.inferred_type == ColumnType::Str)
    );
    assert!(outcome.consistency.is_empty());
    let report = ConsistencyReport::load(&outputs.consistency).unwrap();
    assert!(report.is_empty());
}

#[test]
fn header_row_setting_skips_preamble() {
    let ws = TestWorkspace::new();
    let csv = ws.write(
        "export.csv",
        "Sales export\ngenerated 2024-05-01\ncode,price\nA1,100\nB2,250\n",
    );
    let config = AuditConfig {
        header_row: 3,
        ..ws.config()
    };
    let outcome = engine(config).infer(&csv, None).unwrap();
    assert_eq!(outcome.headers, vec!["code", "price"]);
    assert_eq!(types(&outcome.schema), vec![ColumnType::Str, ColumnType::Int]);
}

#[test]
fn header_row_past_end_is_rejected() {
    let ws = TestWorkspace::new();
    let csv = ws.write("short.csv", "a,b\n1,2\n");
    let config = AuditConfig {
        header_row: 5,
        ..ws.config()
    };
    let err = engine(config).infer(&csv, None).unwrap_err();
    assert!(matches!(
        err,
        AuditError::HeaderRowOutOfRange {
            header_row: 5,
            records: 2,
            ..
        }
    ));
}

#[test]
fn run_writes_schema_and_consistency_documents() {
    let ws = TestWorkspace::new();
    let csv = ws.write("orders.csv", "id,amount\n1,10.5\n2,x\n3,7\n");
    let config = AuditConfig {
        acceptance_ratio: 0.5,
        ..ws.config()
    };
    let outputs = OutputPaths::for_input(&config, &csv);
    assert_eq!(outputs.schema, ws.path().join("schema/orders_schema.json"));
    assert_eq!(
        outputs.consistency,
        ws.path().join("schema/orders_consistency.json")
    );

    let outcome = engine(config).run(&csv, None, &outputs).unwrap();
    assert_eq!(outcome.written.as_ref(), Some(&outputs));

    let schema = Schema::load(&outputs.schema).unwrap();
    assert_eq!(schema, outcome.schema);
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outputs.consistency).unwrap()).unwrap();
    let amount = &raw[1];
    assert_eq!(amount["column_name"], "amount");
    assert_eq!(amount["inferred_type"], "FLOAT");
    assert_eq!(amount["mismatch_count"], 1);
    assert_eq!(amount["mismatches"][0]["row_index"], 2);
    assert_eq!(amount["mismatches"][0]["raw_value"], "x");
    assert_eq!(outcome.low_consistency_columns(0.9), vec!["amount"]);
}

#[test]
fn missing_file_fails_without_writing() {
    let ws = TestWorkspace::new();
    let config = ws.config();
    let csv = ws.path().join("absent.csv");
    let outputs = OutputPaths::for_input(&config, &csv);
    let err = engine(config).run(&csv, None, &outputs).unwrap_err();
    assert!(matches!(err, AuditError::NotFound { .. }));
    assert!(!outputs.schema.exists());
    assert!(!outputs.consistency.exists());
}

#[test]
fn failed_report_write_leaves_no_schema_behind() {
    let ws = TestWorkspace::new();
    let csv = ws.write("orders.csv", "id,amount\n1,10.5\n");
    ws.write("blocked", "a plain file, not a directory");
    let outputs = OutputPaths {
        schema: ws.path().join("out/orders_schema.json"),
        consistency: ws.path().join("blocked/orders_consistency.json"),
    };

    let err = engine(ws.config()).run(&csv, None, &outputs).unwrap_err();
    assert!(matches!(err, AuditError::Io(_)));
    assert!(!outputs.schema.exists());
    assert!(!outputs.consistency.exists());
}

#[test]
fn verify_reports_drift_against_stored_schema() {
    let ws = TestWorkspace::new();
    let first = ws.write("day1.csv", "id,amount\n1,10\n2,20\n");
    let config = ws.config();
    let outputs = OutputPaths::for_input(&config, &first);
    let engine = engine(config);
    engine.run(&first, None, &outputs).unwrap();

    let second = ws.write("day2.csv", "id,amount\n3,30\n4,pending\n");
    let schema = Schema::load(&outputs.schema).unwrap();
    let report = engine.verify(&second, &schema, None).unwrap();
    let amount = &report.columns[1];
    assert_eq!(amount.inferred_type, ColumnType::Int);
    assert_eq!(amount.match_ratio, 0.5);
    assert_eq!(amount.all_mismatch_rows, vec![2]);
}

#[test]
fn verify_rejects_renamed_headers() {
    let ws = TestWorkspace::new();
    let csv = ws.write("day.csv", "id,total\n1,10\n");
    let schema = Schema::from_headers(&["id".to_string(), "amount".to_string()]);
    let err = engine(ws.config()).verify(&csv, &schema, None).unwrap_err();
    match err {
        AuditError::SchemaMismatch { detail, .. } => {
            assert!(detail.contains("expected 'amount' but found 'total'"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}
