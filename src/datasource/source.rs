use crate::error::Result;
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named column of a tree, together with the branch it is stored in.
pub struct Leaf {
    name: String,
    branch: String,
}

impl Leaf {
    pub fn new(name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            branch: branch.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

/// Implement this trait to expose a tree-shaped storage engine to `RecordIterator`.
///
/// Leaves are addressed by their position in [`DataSource::leaves`]. Reads go
/// through [`DataSource::load_entry`]: afterwards `leaf_len` and `leaf_value`
/// describe that row for every leaf whose branch is active. Branch activation
/// is only an I/O hint; a source without selective reads may ignore it.
pub trait DataSource: Debug {
    /// Total number of rows.
    fn entries(&self) -> usize;

    /// All leaves, in the source's native enumeration order.
    fn leaves(&self) -> &[Leaf];

    /// Marks one branch as read (or skipped) by subsequent `load_entry` calls.
    fn set_branch_status(&mut self, branch: &str, active: bool);

    /// Marks every branch at once.
    fn set_all_branch_status(&mut self, active: bool);

    /// Loads row `entry` for the active branches.
    fn load_entry(&mut self, entry: usize) -> Result<()>;

    /// Number of values `leaf` holds at the loaded row; 1 means scalar.
    fn leaf_len(&self, leaf: usize) -> usize;

    /// Value `index` of `leaf` at the loaded row.
    fn leaf_value(&self, leaf: usize, index: usize) -> f64;
}

/// Names of every leaf of `source`, in enumeration order.
pub fn list_leaves<S: DataSource + ?Sized>(source: &S) -> Vec<String> {
    source
        .leaves()
        .iter()
        .map(|leaf| leaf.name().to_string())
        .collect()
}
