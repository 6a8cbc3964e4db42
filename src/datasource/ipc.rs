use crate::datasource::tree::ArrowTree;
use crate::error::Result;
use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::FileReader;
use std::fs::File;
use std::path::Path;

/// Schema metadata key naming the tree stored in an Arrow IPC file.
pub const TREE_NAME_KEY: &str = "tree.name";

/// Reads the footer and schema of an Arrow IPC file without touching its batches.
pub fn read_schema(path: &Path) -> Result<SchemaRef> {
    let reader = FileReader::try_new(File::open(path)?, None)?;
    Ok(reader.schema())
}

/// Name of the tree held in an Arrow IPC file: the `tree.name` metadata
/// entry if present, the file stem otherwise.
pub fn tree_name(schema: &SchemaRef, path: &Path) -> String {
    match schema.metadata().get(TREE_NAME_KEY) {
        Some(name) => name.clone(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Loads every batch of an Arrow IPC file into one tree.
pub fn read_tree(path: &Path, name: &str) -> Result<ArrowTree> {
    let reader = FileReader::try_new(File::open(path)?, None)?;
    let schema = reader.schema();

    let mut batches = vec![];
    for batch in reader {
        batches.push(batch?);
    }

    ArrowTree::from_batches(name, schema, &batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::source::{list_leaves, DataSource};
    use arrow::array::{ArrayRef, Float32Array, Int32Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::ipc::writer::FileWriter;
    use arrow::record_batch::RecordBatch;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn write_batches(path: &Path, schema: SchemaRef, batches: &[RecordBatch]) -> Result<()> {
        let mut writer = FileWriter::try_new(File::create(path)?, &schema)?;
        for batch in batches {
            writer.write(batch)?;
        }
        writer.finish()?;
        Ok(())
    }

    #[test]
    fn test_read_tree_across_batches() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("events.arrow");
        let schema = Arc::new(Schema::new(vec![
            Field::new("run", DataType::Int32, false),
            Field::new("energy", DataType::Float32, false),
        ]));
        let first = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![1, 1])) as ArrayRef,
                Arc::new(Float32Array::from(vec![0.5, 1.5])) as ArrayRef,
            ],
        )?;
        let second = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![2])) as ArrayRef,
                Arc::new(Float32Array::from(vec![2.5])) as ArrayRef,
            ],
        )?;
        write_batches(&path, schema.clone(), &[first, second])?;

        let mut tree = read_tree(&path, "events")?;

        assert_eq!(tree.entries(), 3);
        assert_eq!(list_leaves(&tree), vec!["run", "energy"]);
        tree.load_entry(2)?;
        assert_eq!(tree.leaf_value(0, 0), 2.0);
        assert_eq!(tree.leaf_value(1, 0), 2.5);
        Ok(())
    }

    #[test]
    fn test_tree_name_prefers_metadata() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("file.arrow");
        let schema = Arc::new(
            Schema::new(vec![Field::new("x", DataType::Int32, false)]).with_metadata(
                HashMap::from([(TREE_NAME_KEY.to_string(), "ntuple".to_string())]),
            ),
        );
        write_batches(&path, schema, &[])?;

        let schema = read_schema(&path)?;
        assert_eq!(tree_name(&schema, &path), "ntuple");

        let plain = Arc::new(Schema::new(vec![Field::new("x", DataType::Int32, false)]));
        assert_eq!(tree_name(&plain, &path), "file");
        Ok(())
    }

    #[test]
    fn test_read_schema_rejects_garbage() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.arrow");
        std::fs::write(&path, b"definitely not arrow")?;

        assert!(read_schema(&path).is_err());
        Ok(())
    }
}
