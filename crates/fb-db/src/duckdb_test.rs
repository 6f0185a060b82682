use super::*;
use fb_core::{adjust, IndexConvention, InflationTable};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn name(s: &str) -> SeriesName {
    SeriesName::parse(s).unwrap()
}

fn series(n: &str, records: Vec<LongRecord>) -> Series {
    Series::new(name(n), ValueType::Integer, None, records).unwrap()
}

fn count(db: &DuckDbBackend, sql: &str) -> i64 {
    let conn = db.lock().unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
    assert!(db.list_series().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_and_read_back_in_order() {
    let db = DuckDbBackend::in_memory().unwrap();
    let s = series(
        "rvh",
        vec![
            LongRecord::new("Butler", 2008, 30.0),
            LongRecord::new("Allegheny", 2008, 20.0),
            LongRecord::new("Allegheny", 2007, 10.0),
        ],
    );

    let written = db.replace_series(s.name(), SeriesRows::Long(&s)).await.unwrap();
    assert_eq!(written, 3);
    assert!(db.series_exists(&name("rvh")).await.unwrap());

    let read = db.read_series(&name("rvh")).await.unwrap();
    let keys: Vec<(&str, i32)> = read
        .records()
        .iter()
        .map(|r| (r.entity.as_str(), r.year))
        .collect();
    assert_eq!(
        keys,
        vec![("Allegheny", 2007), ("Allegheny", 2008), ("Butler", 2008)]
    );
    assert_eq!(read.value_type(), ValueType::Integer);
    assert_eq!(read.get("Butler", 2008).unwrap().value, Some(30.0));
}

#[tokio::test]
async fn test_replace_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let s = series(
        "rvm",
        vec![
            LongRecord::new("A", 2007, 1.0),
            LongRecord::new("A", 2008, 2.0),
        ],
    );

    db.replace_series(s.name(), SeriesRows::Long(&s)).await.unwrap();
    let once = db.read_series(s.name()).await.unwrap();
    db.replace_series(s.name(), SeriesRows::Long(&s)).await.unwrap();
    let twice = db.read_series(s.name()).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM rvm"), 2);
}

#[tokio::test]
async fn test_replace_drops_previous_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    let first = series(
        "rvh",
        vec![
            LongRecord::new("A", 2007, 1.0),
            LongRecord::new("B", 2007, 2.0),
        ],
    );
    let second = series("rvh", vec![LongRecord::new("C", 2010, 5.0)]);

    db.replace_series(first.name(), SeriesRows::Long(&first))
        .await
        .unwrap();
    db.replace_series(second.name(), SeriesRows::Long(&second))
        .await
        .unwrap();

    let read = db.read_series(&name("rvh")).await.unwrap();
    assert_eq!(read.entities().into_iter().collect::<Vec<_>>(), vec!["C"]);
}

#[tokio::test]
async fn test_null_values_round_trip() {
    let db = DuckDbBackend::in_memory().unwrap();
    let s = series(
        "gaps",
        vec![
            LongRecord::new("A", 2007, 1.0),
            LongRecord {
                entity: "A".to_string(),
                year: 2008,
                value: None,
            },
        ],
    );
    db.replace_series(s.name(), SeriesRows::Long(&s)).await.unwrap();

    let read = db.read_series(s.name()).await.unwrap();
    assert_eq!(read.get("A", 2008).unwrap().value, None);
}

#[tokio::test]
async fn test_adjusted_layout_is_readable_as_series() {
    let db = DuckDbBackend::in_memory().unwrap();
    let s = series(
        "alloc",
        vec![
            LongRecord::new("A", 2007, 100.0),
            LongRecord::new("A", 2008, 100.0),
        ],
    );
    let table = InflationTable::new(BTreeMap::from([(2007, 200.0), (2008, 250.0)])).unwrap();
    let adjusted = adjust(
        &s,
        &table,
        IndexConvention::RebaseToYear(2007),
        name("alloc_adjusted"),
    )
    .unwrap();

    db.replace_series(&adjusted.name, SeriesRows::Adjusted(&adjusted))
        .await
        .unwrap();

    let read = db.read_series(&name("alloc_adjusted")).await.unwrap();
    assert_eq!(read.get("A", 2007).unwrap().value, Some(100.0));
    assert_eq!(read.get("A", 2008).unwrap().value, Some(125.0));
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM alloc_adjusted WHERE original_value = 100 AND index_factor = 1.25"
        ),
        1
    );
}

#[tokio::test]
async fn test_layout_mismatch_keeps_existing_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    let s = series("alloc", vec![LongRecord::new("A", 2007, 100.0)]);
    db.replace_series(s.name(), SeriesRows::Long(&s)).await.unwrap();

    let table = InflationTable::new(BTreeMap::from([(2007, 1.0)])).unwrap();
    let adjusted = adjust(&s, &table, IndexConvention::PresentRatio, name("alloc_real")).unwrap();

    let err = db
        .replace_series(&name("alloc"), SeriesRows::Adjusted(&adjusted))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::SchemaMismatch { .. }));
    assert_eq!(count(&db, "SELECT COUNT(*) FROM alloc"), 1);
}

#[tokio::test]
async fn test_failed_transaction_rolls_back_delete() {
    let db = DuckDbBackend::in_memory().unwrap();
    let s = series(
        "rvh",
        vec![
            LongRecord::new("A", 2007, 1.0),
            LongRecord::new("A", 2008, 2.0),
        ],
    );
    db.replace_series(s.name(), SeriesRows::Long(&s)).await.unwrap();

    {
        let conn = db.lock().unwrap();
        let result: DbResult<()> = transaction(&conn, |conn| {
            conn.execute_batch("DELETE FROM rvh")?;
            Err(DbError::ExecutionError("write interrupted".to_string()))
        });
        assert!(result.is_err());
    }

    assert_eq!(count(&db, "SELECT COUNT(*) FROM rvh"), 2);
}

#[tokio::test]
async fn test_read_missing_series() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.read_series(&name("nope")).await.unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)));
    assert!(!db.series_exists(&name("nope")).await.unwrap());
}

#[tokio::test]
async fn test_load_wide_csv_reads_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sec1513alloc.csv");
    std::fs::write(
        &path,
        "Department,2006,2007\nAllegheny,\"$1,234\",-\nButler,,007\n",
    )
    .unwrap();

    let db = DuckDbBackend::in_memory().unwrap();
    let table = db.load_wide_csv(&path).await.unwrap();

    assert_eq!(table.headers, vec!["Department", "2006", "2007"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0][1], RawCell::Text("$1,234".to_string()));
    assert_eq!(table.rows[0][2], RawCell::Text("-".to_string()));
    assert_eq!(table.rows[1][1], RawCell::Missing);
    assert_eq!(table.rows[1][2], RawCell::Text("007".to_string()));
}

#[tokio::test]
async fn test_load_wide_csv_missing_file() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db
        .load_wide_csv(Path::new("/no/such/file.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::CsvError { .. }));
}

#[tokio::test]
async fn test_file_database_persists_between_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("farebox.duckdb");
    let s = series("rvh", vec![LongRecord::new("A", 2007, 1.0)]);

    {
        let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
        db.replace_series(s.name(), SeriesRows::Long(&s)).await.unwrap();
    }

    let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
    assert_eq!(db.list_series().await.unwrap(), vec!["rvh"]);
    assert_eq!(db.read_series(s.name()).await.unwrap(), s);
}
