use super::*;
use serial_test::serial;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
name: transit_funding
database:
  path: target/farebox.duckdb
source_paths: [data, extra]
years: { start: 2006, end: 2023 }
inflation:
  cpi_2007:
    description: CPI-U annual averages
    convention: { rebase_to_year: 2007 }
    index: { 2007: 207.342, 2008: 215.303 }
  ratio_2023:
    convention: present_ratio
    index: { 2022: 1.02, 2023: 1.00 }
adjustments:
  - name: sec1513_real
    series: sec1513alloc
    table: ratio_2023
    output: sec1513alloc_adjusted
analyses:
  - name: funding_vs_ridership
    funding: sec1513alloc_adjusted
    responses: [rvh, rvm]
    lag: 2
    eligibility: { series: totalpassengers, threshold: 1000000 }
    coverage: { min_retained_rows: 10, min_entity_coverage: 0.5 }
screens:
  - name: allocation_vs_passengers
    series_a: sec1513alloc
    series_b: totalpassengers
    max_a: 200000000
    max_b: 50000000
    require_positive: true
"#;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("name: test\nyears: {start: 2006, end: 2023}").unwrap();
    assert_eq!(config.name, "test");
    assert_eq!(config.database.path, ":memory:");
    assert_eq!(config.source_paths, vec!["data"]);
    assert!(config.inflation.is_empty());
    assert!(config.analyses.is_empty());
    config.validate().unwrap();
}

#[test]
fn test_parse_full_config() {
    let config: Config = serde_yaml::from_str(FULL_CONFIG).unwrap();
    config.validate().unwrap();

    assert_eq!(config.years, YearRange::new(2006, 2023).unwrap());

    let cpi = config.inflation_table("cpi_2007").unwrap();
    assert_eq!(cpi.convention, IndexConvention::RebaseToYear(2007));
    assert_eq!(cpi.index.get(2008), Some(215.303));

    let ratio = config.inflation_table("ratio_2023").unwrap();
    assert_eq!(ratio.convention, IndexConvention::PresentRatio);

    let analysis = &config.analyses[0];
    assert_eq!(analysis.lag, 2);
    assert_eq!(analysis.responses.len(), 2);
    assert_eq!(analysis.eligibility.threshold, 1_000_000.0);
    assert_eq!(analysis.coverage.min_retained_rows, Some(10));

    let bounds = config.screens[0].bounds();
    assert_eq!(bounds.max_a, Some(200_000_000.0));
    assert!(bounds.require_positive);
}

#[test]
fn test_unknown_inflation_table_is_invalid() {
    let yaml = FULL_CONFIG.replace("table: ratio_2023", "table: nope");
    let config: Config = serde_yaml::from_str(&yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("unknown inflation table 'nope'"));
}

#[test]
fn test_adjustment_cannot_overwrite_input() {
    let yaml = FULL_CONFIG.replace("output: sec1513alloc_adjusted", "output: sec1513alloc");
    let config: Config = serde_yaml::from_str(&yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_reversed_years_are_invalid() {
    let config: Config =
        serde_yaml::from_str("name: test\nyears: {start: 2023, end: 2006}").unwrap();
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_duplicate_analysis_names_are_invalid() {
    let mut config: Config = serde_yaml::from_str(FULL_CONFIG).unwrap();
    let dup = config.analyses[0].clone();
    config.analyses.push(dup);
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Duplicate analysis name"));
}

#[test]
fn test_bad_series_name_fails_to_parse() {
    let yaml = FULL_CONFIG.replace("series: sec1513alloc\n", "series: Sec 1513\n");
    assert!(serde_yaml::from_str::<Config>(&yaml).is_err());
}

#[test]
fn test_unknown_fields_are_rejected() {
    let yaml = "name: test\nyears: {start: 2006, end: 2023}\nlag: 4";
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_load_from_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("farebox.yml"), FULL_CONFIG).unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "transit_funding");
    assert_eq!(
        config.source_paths_absolute(dir.path()),
        vec![dir.path().join("data"), dir.path().join("extra")]
    );
}

#[test]
fn test_load_from_dir_missing() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        Config::load_from_dir(dir.path()),
        Err(CoreError::ConfigNotFound { .. })
    ));
}

#[test]
#[serial]
fn test_database_path_resolution_order() {
    let config: Config = serde_yaml::from_str(FULL_CONFIG).unwrap();

    std::env::remove_var(DB_PATH_ENV);
    assert_eq!(config.resolve_database_path(None), "target/farebox.duckdb");

    std::env::set_var(DB_PATH_ENV, "/tmp/env.duckdb");
    assert_eq!(config.resolve_database_path(None), "/tmp/env.duckdb");
    assert_eq!(
        config.resolve_database_path(Some(":memory:")),
        ":memory:"
    );
    std::env::remove_var(DB_PATH_ENV);
}

#[test]
fn test_convention_yaml_forms() {
    let rebase: InflationConfig =
        serde_yaml::from_str("convention: { rebase_to_year: 2007 }\nindex: { 2007: 200.0 }")
            .unwrap();
    assert_eq!(rebase.convention, IndexConvention::RebaseToYear(2007));

    let block: InflationConfig = serde_yaml::from_str(
        "convention:\n  rebase_to_year: 2010\nindex:\n  2010: 1.0\n",
    )
    .unwrap();
    assert_eq!(block.convention, IndexConvention::RebaseToYear(2010));

    let ratio: InflationConfig =
        serde_yaml::from_str("convention: present_ratio\nindex: { 2023: 1.0 }").unwrap();
    assert_eq!(ratio.convention, IndexConvention::PresentRatio);

    assert!(serde_yaml::from_str::<InflationConfig>(
        "convention: { rebase_to_nowhere: 2007 }\nindex: { 2007: 1.0 }"
    )
    .is_err());
}

#[test]
fn test_cli_fixture_configs_load() {
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../fb-cli/tests/fixtures/transit_project");
    for file in ["farebox.yml", "farebox_missing_index.yml"] {
        let config = Config::load(&fixture.join(file)).unwrap();
        assert_eq!(
            config.inflation["cpi_2007"].convention,
            IndexConvention::RebaseToYear(2007)
        );
    }
}
