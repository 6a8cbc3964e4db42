use crate::error::Result;
use arrow::{
    compute::concat,
    datatypes::SchemaRef,
    record_batch::{RecordBatch, RecordBatchOptions},
};

/// Concatenates an array of `RecordBatch` into one batch
pub fn concat_batches(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<RecordBatch> {
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema.clone()));
    }
    if batches.len() == 1 {
        return Ok(batches[0].clone());
    }
    let mut arrays = Vec::with_capacity(schema.fields().len());
    for i in 0..schema.fields().len() {
        let array = concat(
            &batches
                .iter()
                .map(|batch| batch.column(i).as_ref())
                .collect::<Vec<_>>(),
        )?;
        arrays.push(array);
    }
    // A tree without leaves still has entries, so the row count must be explicit.
    let num_rows = batches.iter().map(|batch| batch.num_rows()).sum();
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    Ok(RecordBatch::try_new_with_options(
        schema.clone(),
        arrays,
        &options,
    )?)
}

/// Strips the leading separators of an in-container path, so `/events` and
/// `events` name the same object.
pub fn normalize_tree_path(path: &str) -> &str {
    path.trim_start_matches('/')
}
