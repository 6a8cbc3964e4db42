use crate::config::CsvOptions;
use crate::datasource::tree::ArrowTree;
use crate::error::{Error, Result};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

/// Reads a delimited text file into a tree of scalar leaves, one per column.
pub fn read_tree(path: &Path, name: &str, options: &CsvOptions) -> Result<ArrowTree> {
    let delimiter = options
        .delimiter_byte()
        .ok_or_else(|| Error::no_such_tree(name, "CSV delimiter must be a single byte"))?;
    let mut file = File::open(path)?;

    // Uses Arrow's CSV Reader to get the tree's schema.
    let format = Format::default()
        .with_header(options.has_header)
        .with_delimiter(delimiter);
    let (schema, _) = format.infer_schema(&mut file, options.max_infer_records)?;
    let schema = Arc::new(schema);

    file.rewind()?;

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(options.has_header)
        .with_delimiter(delimiter)
        .with_batch_size(options.batch_size)
        .build(file)?;

    let mut batches = vec![];
    for batch in reader {
        batches.push(batch?);
    }

    ArrowTree::from_batches(name, schema, &batches)
}
