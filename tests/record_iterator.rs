use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, ListArray};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use rs_tree_iter::{IteratorConfig, Record, RecordIterator, Result, Value};

/// Writes the x/y/arr tree with three entries to `path`.
fn write_events(path: &Path) -> Result<()> {
    let arr = ListArray::from_iter_primitive::<Float64Type, _, _>(vec![
        Some(vec![Some(5.0), Some(6.0)]),
        Some(vec![Some(7.0), Some(8.0), Some(9.0)]),
        Some(vec![Some(10.0), Some(11.0)]),
    ]);
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::Float64, false),
        Field::new("y", DataType::Float64, false),
        Field::new("arr", arr.data_type().clone(), true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(vec![1.0, 3.0, 5.0])) as ArrayRef,
            Arc::new(Float64Array::from(vec![2.0, 4.0, 6.0])) as ArrayRef,
            Arc::new(arr) as ArrayRef,
        ],
    )?;

    let mut writer = FileWriter::try_new(File::create(path)?, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}

#[test]
fn select_array_and_scalar_from_ipc_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("events.arrow");
    write_events(&path)?;
    let locator = path.to_str().unwrap();

    let mut iter = RecordIterator::open(locator, "events")?;
    assert_eq!(iter.labels(), &["x", "y", "arr"]);
    assert_eq!(iter.entries(), 3);
    assert_eq!(iter.file_name(), locator);
    assert_eq!(iter.path(), "events");

    let record = iter.select(["arr", "x"])?.next().unwrap()?;
    assert_eq!(
        record,
        Record::new(vec![Value::Array(vec![5.0, 6.0]), Value::Scalar(1.0)])
    );

    let rest = iter.collect::<Result<Vec<_>>>()?;
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0][0].as_array(), Some(&[7.0, 8.0, 9.0][..]));
    Ok(())
}

#[test]
fn nonexistent_leaf_fails_before_any_record() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("events.arrow");
    write_events(&path)?;

    let mut iter = RecordIterator::open(path.to_str().unwrap(), "/events")?;
    let err = iter.select(["nonexistent"]).unwrap_err();

    assert!(err.is_selection());
    assert_eq!(iter.index(), 0);
    Ok(())
}

#[test]
fn empty_selection_over_csv() -> Result<()> {
    let mut iter = RecordIterator::open("data/test.csv", "test")?;
    let records = iter
        .select(Vec::<String>::new())?
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(records.len(), 5);
    assert!(records.iter().all(Record::is_empty));
    Ok(())
}

#[test]
fn open_failures_are_io_errors() {
    let missing = RecordIterator::open("data/missing.arrow", "events").unwrap_err();
    assert!(missing.is_io());
    assert!(missing.to_string().contains("data/missing.arrow"));

    let wrong_path = RecordIterator::open("data/test.csv", "events").unwrap_err();
    assert!(wrong_path.is_io());
    assert!(wrong_path.to_string().contains("\"events\""));

    let unnamed = RecordIterator::open("data/unnamed.csv", "unnamed").unwrap_err();
    assert!(unnamed.is_io());
    assert!(!unnamed.is_selection());
}

#[test]
fn iterator_from_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_events(&dir.path().join("events.arrow"))?;
    let config = IteratorConfig::from_json_str(&format!(
        r#"{{ "fileName": {:?}, "path": "events", "selection": ["y", "arr"] }}"#,
        dir.path().to_str().unwrap()
    ))?;

    let mut iter = RecordIterator::from_config(&config)?;
    assert_eq!(iter.selection(), &["y", "arr"]);

    let last = iter.nth(2).unwrap()?;
    assert_eq!(serde_json::to_string(&last).unwrap(), "[6.0,[10.0,11.0]]");

    let bad = IteratorConfig::from_json_str(&format!(
        r#"{{ "fileName": {:?}, "path": "events", "selection": "y" }}"#,
        dir.path().to_str().unwrap()
    ))?;
    assert!(RecordIterator::from_config(&bad).unwrap_err().is_selection());
    Ok(())
}
