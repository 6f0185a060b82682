//! Integration tests for the fb binary against the transit fixture project

use fb_core::Project;
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const PROJECT: &str = "tests/fixtures/transit_project";

/// Path to the compiled fb binary
fn fb_bin() -> String {
    env!("CARGO_BIN_EXE_fb").to_string()
}

/// Run an `fb` command against the fixture project with a database in
/// `db_dir`, returning (stdout, stderr, exit code).
fn run_fb(db_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let db_path = db_dir.path().join("farebox.duckdb");
    let output = Command::new(fb_bin())
        .args(["-p", PROJECT, "--database", db_path.to_str().unwrap()])
        .args(args)
        .env_remove("FAREBOX_DB_PATH")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute fb with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn ingest_and_adjust(db_dir: &TempDir) {
    let (stdout, stderr, code) = run_fb(db_dir, &["ingest"]);
    assert_eq!(code, 0, "ingest failed:\n{stdout}\n{stderr}");
    let (stdout, stderr, code) = run_fb(db_dir, &["adjust"]);
    assert_eq!(code, 0, "adjust failed:\n{stdout}\n{stderr}");
}

#[test]
fn test_load_fixture_project() {
    let project = Project::load(Path::new(PROJECT)).unwrap();

    assert_eq!(project.config.name, "transit_project");
    let names: Vec<&str> = project.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["rvh", "rvm", "sec1513alloc", "totalpassengers"]);
    assert_eq!(project.config.analyses[0].responses.len(), 2);
}

#[test]
fn test_ingest_reports_each_source() {
    let db = TempDir::new().unwrap();
    let (stdout, _, code) = run_fb(&db, &["ingest"]);

    assert_eq!(code, 0);
    assert!(stdout.contains("✓ sec1513alloc (12 rows, 3 entities)"), "{stdout}");
    assert!(stdout.contains("✓ rvm (8 rows, 2 entities)"), "{stdout}");
    assert!(stdout.contains("Ingested 4 sources (44 total rows)"), "{stdout}");
}

#[test]
fn test_ingest_selected_sources() {
    let db = TempDir::new().unwrap();
    let (stdout, _, code) = run_fb(&db, &["ingest", "--sources", "rvh"]);

    assert_eq!(code, 0);
    assert!(stdout.contains("✓ rvh"));
    assert!(!stdout.contains("sec1513alloc"));
}

#[test]
fn test_unknown_source_is_rejected() {
    let db = TempDir::new().unwrap();
    let (_, stderr, code) = run_fb(&db, &["ingest", "--sources", "nope"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown source 'nope'"), "{stderr}");
}

#[test]
fn test_export_cleans_source_values() {
    let db = TempDir::new().unwrap();
    run_fb(&db, &["ingest", "--sources", "sec1513alloc"]);
    let (stdout, _, code) = run_fb(&db, &["export", "sec1513alloc", "-o", "json"]);

    assert_eq!(code, 0);
    let rows: Vec<Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["entity"], "X");
    assert_eq!(rows[0]["2007"], 100);
    assert_eq!(rows[1]["entity"], "Y");
    assert_eq!(rows[1]["2007"], 1000);
    // "-" in the source is a zero allocation
    assert_eq!(rows[1]["2009"], 0);
}

#[test]
fn test_adjust_keeps_base_year_and_applies_factors() {
    let db = TempDir::new().unwrap();
    ingest_and_adjust(&db);

    let (stdout, _, code) = run_fb(&db, &["export", "sec1513alloc_2007", "-o", "json"]);
    assert_eq!(code, 0);
    let rows: Vec<Value> = serde_json::from_str(&stdout).unwrap();
    let x = &rows[0];
    assert_eq!(x["entity"], "X");
    assert_eq!(x["2007"].as_f64(), Some(100.0));
    assert_eq!(x["2010"].as_f64(), Some(162.5));
}

#[test]
fn test_lag_scenario_json() {
    let db = TempDir::new().unwrap();
    ingest_and_adjust(&db);

    let (stdout, stderr, code) = run_fb(&db, &["lag", "-o", "json"]);
    assert_eq!(code, 0, "{stderr}");

    let analyses: Vec<Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0]["analysis"], "funding_vs_ridership");

    let outcomes = analyses[0]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);

    let rvh = outcomes
        .iter()
        .find(|o| o["report"]["response"] == "rvh")
        .unwrap();
    let rows = rvh["rows"].as_array().unwrap();
    for row in rows {
        let year_a = row["year_a"].as_i64().unwrap();
        let year_b = row["year_b"].as_i64().unwrap();
        assert_eq!(year_b - year_a, 1);
    }

    let x_rows: Vec<&Value> = rows.iter().filter(|r| r["entity"] == "X").collect();
    assert_eq!(x_rows.len(), 1);
    assert_eq!(x_rows[0]["year_a"], 2008);
    assert_eq!(x_rows[0]["year_b"], 2009);
    assert!((x_rows[0]["pct_change_a"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert!((x_rows[0]["pct_change_b"].as_f64().unwrap() - 20.0).abs() < 1e-9);

    let report = &rvh["report"];
    assert_eq!(report["candidates"], 12);
    assert_eq!(report["unmatched"], 3);
    assert_eq!(report["ineligible"], 4);
    assert_eq!(report["undefined_change"], 2);
    assert_eq!(report["emitted"], 3);
    assert_eq!(report["warnings"][0]["kind"], "low_entity_coverage");
}

#[test]
fn test_lag_override_changes_alignment() {
    let db = TempDir::new().unwrap();
    ingest_and_adjust(&db);

    let (stdout, _, code) = run_fb(&db, &["lag", "--lag", "2", "-o", "json"]);
    assert_eq!(code, 0);

    let analyses: Vec<Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(analyses[0]["lag"], 2);
    for outcome in analyses[0]["outcomes"].as_array().unwrap() {
        for row in outcome["rows"].as_array().unwrap() {
            assert_eq!(
                row["year_b"].as_i64().unwrap() - row["year_a"].as_i64().unwrap(),
                2
            );
        }
    }
}

#[test]
fn test_lag_before_ingest_is_a_store_error() {
    let db = TempDir::new().unwrap();
    let (_, stderr, code) = run_fb(&db, &["lag"]);

    assert_eq!(code, 4);
    assert!(stderr.contains("sec1513alloc_adjusted"), "{stderr}");
}

#[test]
fn test_missing_index_fails_and_writes_nothing() {
    let db = TempDir::new().unwrap();
    run_fb(&db, &["ingest"]);

    let config = format!("{PROJECT}/farebox_missing_index.yml");
    let (stdout, _, code) = run_fb(&db, &["-c", &config, "adjust"]);
    assert_eq!(code, 2);
    assert!(stdout.contains("✗ sec1513_present"), "{stdout}");
    assert!(stdout.contains("[I001]"), "{stdout}");
    assert!(stdout.contains("2010"), "{stdout}");

    // Neither the failing adjustment nor the later one was written
    let (_, _, code) = run_fb(&db, &["export", "sec1513alloc_adjusted"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_fb(&db, &["export", "sec1513alloc_2007"]);
    assert_ne!(code, 0);
}

#[test]
fn test_screen_reports_exclusions() {
    let db = TempDir::new().unwrap();
    run_fb(&db, &["ingest"]);

    let (stdout, _, code) = run_fb(&db, &["screen"]);
    assert_eq!(code, 0);
    assert!(
        stdout.contains("6 kept, 6 excluded (2 entities affected, 1 fully excluded)"),
        "{stdout}"
    );
    assert!(stdout.contains("non-positive value"));
    assert!(stdout.contains("series B at or above bound"));
}

#[test]
fn test_run_full_pipeline() {
    let db = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_fb(&db, &["run"]);

    assert_eq!(code, 0, "{stdout}\n{stderr}");
    assert!(stdout.contains("Ingested 4 sources"));
    assert!(stdout.contains("Applied 2 adjustments"));
    assert!(stdout.contains("funding_vs_ridership: sec1513alloc_adjusted -> rvh (lag 1"));
    assert!(stdout.contains("⚠ only 2 of 3 entities retained"));
    assert!(stdout.contains("allocation_vs_passengers: sec1513alloc vs totalpassengers"));
}

#[test]
fn test_run_is_repeatable() {
    let db = TempDir::new().unwrap();
    let (first, _, code) = run_fb(&db, &["run"]);
    assert_eq!(code, 0);
    let (second, _, code) = run_fb(&db, &["run"]);
    assert_eq!(code, 0);
    assert_eq!(first, second);
}
