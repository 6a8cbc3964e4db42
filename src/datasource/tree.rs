use crate::datasource::source::{DataSource, Leaf};
use crate::error::{Error, Result};
use crate::util::concat_batches;
use arrow::array::{
    Array, ArrayRef, FixedSizeListArray, Float64Array, LargeListArray, ListArray, StructArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::ops::Range;
use tracing::debug;

/// Per-row storage of one leaf, already widened to `f64`.
#[derive(Debug)]
enum LeafData {
    Scalar(Float64Array),
    Array {
        ranges: Vec<Range<usize>>,
        values: Float64Array,
    },
}

#[derive(Debug)]
struct LeafColumn {
    data: LeafData,
    branch: usize,
    // Row this leaf was last materialized at. Inactive leaves keep a stale row.
    loaded: Option<usize>,
}

#[derive(Debug)]
struct Branch {
    name: String,
    active: bool,
}

#[derive(Debug)]
/// A tree stored as Arrow columns.
///
/// Every top-level field is a branch. Numeric fields are scalar leaves and
/// lists of numbers are array leaves; a struct field is a branch holding all
/// of its (recursively nested) children as leaves.
pub struct ArrowTree {
    name: String,
    entries: usize,
    leaves: Vec<Leaf>,
    columns: Vec<LeafColumn>,
    branches: Vec<Branch>,
}

impl ArrowTree {
    /// Creates a tree from a single batch, failing if any field cannot be a leaf.
    pub fn try_new(name: impl Into<String>, batch: RecordBatch) -> Result<Self> {
        let name = name.into();
        let schema = batch.schema();

        let mut leaves = vec![];
        let mut columns = vec![];
        let mut branches = vec![];
        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let branch = branches.len();
            branches.push(Branch {
                name: field.name().clone(),
                active: true,
            });
            collect_leaves(field, array, branch, field.name(), &mut leaves, &mut columns)
                .map_err(|reason| Error::no_such_tree(name.as_str(), reason))?;
        }

        debug!(
            tree = %name,
            entries = batch.num_rows(),
            leaves = leaves.len(),
            branches = branches.len(),
            "loaded tree"
        );

        Ok(Self {
            name,
            entries: batch.num_rows(),
            leaves,
            columns,
            branches,
        })
    }

    /// Creates a tree from the batches of one stream sharing `schema`.
    pub fn from_batches(
        name: impl Into<String>,
        schema: SchemaRef,
        batches: &[RecordBatch],
    ) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Self::try_new(name, batch)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Branch names in declaration order.
    pub fn branches(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|branch| branch.name.as_str())
    }

    /// Whether `branch` is currently read by `load_entry`. Unknown names are inactive.
    pub fn is_branch_active(&self, branch: &str) -> bool {
        self.branches
            .iter()
            .any(|b| b.name == branch && b.active)
    }
}

impl DataSource for ArrowTree {
    fn entries(&self) -> usize {
        self.entries
    }

    fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    fn set_branch_status(&mut self, branch: &str, active: bool) {
        match self.branches.iter_mut().find(|b| b.name == branch) {
            Some(b) => b.active = active,
            None => debug!(tree = %self.name, branch, "no such branch"),
        }
    }

    fn set_all_branch_status(&mut self, active: bool) {
        for branch in self.branches.iter_mut() {
            branch.active = active;
        }
    }

    fn load_entry(&mut self, entry: usize) -> Result<()> {
        if entry >= self.entries {
            return Err(Error::EntryOutOfRange {
                entry,
                entries: self.entries,
            });
        }
        for column in self.columns.iter_mut() {
            if self.branches[column.branch].active {
                column.loaded = Some(entry);
            }
        }
        Ok(())
    }

    fn leaf_len(&self, leaf: usize) -> usize {
        let column = &self.columns[leaf];
        match (column.loaded, &column.data) {
            (None, _) => 0,
            (Some(_), LeafData::Scalar(_)) => 1,
            (Some(row), LeafData::Array { ranges, .. }) => ranges[row].len(),
        }
    }

    fn leaf_value(&self, leaf: usize, index: usize) -> f64 {
        let column = &self.columns[leaf];
        let Some(row) = column.loaded else {
            return f64::NAN;
        };
        match &column.data {
            LeafData::Scalar(values) if index == 0 => value_at(values, row),
            LeafData::Scalar(_) => f64::NAN,
            LeafData::Array { ranges, values } => {
                let range = &ranges[row];
                if index < range.len() {
                    value_at(values, range.start + index)
                } else {
                    f64::NAN
                }
            }
        }
    }
}

fn value_at(values: &Float64Array, i: usize) -> f64 {
    if values.is_null(i) {
        f64::NAN
    } else {
        values.value(i)
    }
}

/// Types a scalar leaf may be stored as.
fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

fn to_f64(field: &Field, array: &ArrayRef) -> std::result::Result<Float64Array, String> {
    if !is_numeric(array.data_type()) {
        return Err(format!(
            "leaf `{}` has unsupported type {}",
            field.name(),
            array.data_type()
        ));
    }
    let widened = cast(array.as_ref(), &DataType::Float64).map_err(|e| e.to_string())?;
    widened
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| format!("leaf `{}` could not be widened to Float64", field.name()))
}

fn downcast<'a, T: 'static>(
    field: &Field,
    array: &'a ArrayRef,
) -> std::result::Result<&'a T, String> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| format!("field `{}` does not match its declared type", field.name()))
}

/// Row ranges into a list's child values; null slots are empty.
fn list_ranges<O: Copy + TryInto<usize>>(array: &dyn Array, offsets: &[O]) -> Vec<Range<usize>> {
    offsets
        .windows(2)
        .enumerate()
        .map(|(row, pair)| {
            let start = pair[0].try_into().unwrap_or(0);
            let end = pair[1].try_into().unwrap_or(start);
            if array.is_null(row) {
                start..start
            } else {
                start..end
            }
        })
        .collect()
}

fn collect_leaves(
    field: &Field,
    array: &ArrayRef,
    branch: usize,
    branch_name: &str,
    leaves: &mut Vec<Leaf>,
    columns: &mut Vec<LeafColumn>,
) -> std::result::Result<(), String> {
    let data = match field.data_type() {
        DataType::Struct(_) => {
            let array = downcast::<StructArray>(field, array)?;
            for (child, column) in array.fields().iter().zip(array.columns()) {
                collect_leaves(child, column, branch, branch_name, leaves, columns)?;
            }
            return Ok(());
        }
        DataType::List(item) => {
            let list = downcast::<ListArray>(field, array)?;
            LeafData::Array {
                ranges: list_ranges(list, list.value_offsets()),
                values: to_f64(item, list.values())?,
            }
        }
        DataType::LargeList(item) => {
            let list = downcast::<LargeListArray>(field, array)?;
            LeafData::Array {
                ranges: list_ranges(list, list.value_offsets()),
                values: to_f64(item, list.values())?,
            }
        }
        DataType::FixedSizeList(item, _) => {
            let list = downcast::<FixedSizeListArray>(field, array)?;
            let width = list.value_length() as usize;
            let ranges = (0..list.len())
                .map(|row| {
                    let start = list.value_offset(row) as usize;
                    if list.is_null(row) {
                        start..start
                    } else {
                        start..start + width
                    }
                })
                .collect();
            LeafData::Array {
                ranges,
                values: to_f64(item, list.values())?,
            }
        }
        _ => LeafData::Scalar(to_f64(field, array)?),
    };

    if field.name().is_empty() {
        return Err(format!("leaf in branch `{}` has an empty name", branch_name));
    }
    leaves.push(Leaf::new(field.name().clone(), branch_name));
    columns.push(LeafColumn {
        data,
        branch,
        loaded: None,
    });
    Ok(())
}
