use crate::config::IteratorConfig;
use crate::datasource::{list_leaves, ArrowTree, DataSource, TreeFile};
use crate::error::{Error, Result};
use crate::record::{Record, Value};
use tracing::{debug, warn};

/// Walks the entries of a tree, decoding the selected leaves of each row
/// into a [`Record`].
///
/// The selection is bound with [`RecordIterator::bind`] (or
/// [`RecordIterator::select`]), which validates it against the tree and
/// rewinds the cursor; the iterator then yields one record per entry and
/// `None` once every entry has been read. A freshly constructed iterator has
/// all leaves selected and bound.
///
/// Every mutating operation takes `&mut self`; sharing one iterator between
/// threads needs a lock provided by the caller.
#[derive(Debug)]
pub struct RecordIterator<S: DataSource> {
    source: S,
    file_name: String,
    path: String,
    labels: Vec<String>,
    entries: usize,
    index: usize,
    selection: Vec<String>,
    // Leaf ids of the bound selection; `None` after a failed bind.
    bound: Option<Vec<usize>>,
}

impl RecordIterator<ArrowTree> {
    /// Opens the container at `locator` and the tree at `path` inside it.
    pub fn open(locator: &str, path: &str) -> Result<Self> {
        let tree = TreeFile::open(locator)?.get(path)?;
        Self::new(tree, locator, path)
    }

    /// Builds an iterator from a configuration document, binding its selection if any.
    pub fn from_config(config: &IteratorConfig) -> Result<Self> {
        let selection = config.selection()?;
        let tree = TreeFile::open_with_options(&config.file_name, config.csv.clone())?
            .get(&config.path)?;
        let mut iter = Self::new(tree, config.file_name.as_str(), config.path.as_str())?;
        if let Some(selection) = selection {
            iter.select(selection)?;
        }
        Ok(iter)
    }
}

impl<S: DataSource> RecordIterator<S> {
    /// Wraps an already resolved source. `file_name` and `path` are kept for provenance.
    pub fn new(source: S, file_name: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let labels = list_leaves(&source);
        let entries = source.entries();
        let mut iter = Self {
            source,
            file_name: file_name.into(),
            path: path.into(),
            selection: labels.clone(),
            labels,
            entries,
            index: 0,
            bound: None,
        };
        iter.bind()?;
        Ok(iter)
    }

    /// Validates the selection against the tree and restarts the walk.
    ///
    /// All branches are deactivated first and only those holding selected
    /// leaves are switched back on. On failure, branches activated before the
    /// offending name stay active and the iterator yields nothing until a
    /// later bind succeeds.
    pub fn bind(&mut self) -> Result<&mut Self> {
        self.index = 0;
        self.bound = None;

        if let Some(name) = self.selection.iter().find(|name| name.is_empty()) {
            return Err(Error::selection(name.as_str()));
        }

        self.source.set_all_branch_status(false);

        let mut bound = Vec::with_capacity(self.selection.len());
        for name in self.selection.iter() {
            let found = self
                .source
                .leaves()
                .iter()
                .position(|leaf| leaf.name() == name);
            let Some(leaf) = found else {
                warn!(file_name = %self.file_name, path = %self.path, leaf = %name, "no such leaf");
                return Err(Error::selection(name.as_str()));
            };
            let branch = self.source.leaves()[leaf].branch().to_string();
            self.source.set_branch_status(&branch, true);
            bound.push(leaf);
        }

        debug!(
            file_name = %self.file_name,
            path = %self.path,
            leaves = bound.len(),
            entries = self.entries,
            "bound selection"
        );
        self.bound = Some(bound);
        Ok(self)
    }

    /// Replaces the selection and binds it.
    pub fn select<I, T>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.set_selection(names);
        self.bind()
    }

    /// Replaces the selection. It takes effect at the next bind.
    pub fn set_selection<I, T>(&mut self, names: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.selection = names.into_iter().map(Into::into).collect();
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Position of the next entry to read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves the cursor, clamped to `entries`.
    pub fn set_index(&mut self, index: usize) {
        self.index = index.min(self.entries);
    }

    /// Every leaf name of the tree, as seen at construction.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Number of leaves decoded per record, if a selection is bound.
    pub fn num_leaves(&self) -> Option<usize> {
        self.bound.as_ref().map(Vec::len)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn remaining(&self) -> usize {
        match self.bound {
            Some(_) => self.entries.saturating_sub(self.index),
            None => 0,
        }
    }
}

fn decode_leaf<S: DataSource>(source: &S, leaf: usize) -> Value {
    match source.leaf_len(leaf) {
        1 => Value::Scalar(source.leaf_value(leaf, 0)),
        len => Value::Array((0..len).map(|i| source.leaf_value(leaf, i)).collect()),
    }
}

impl<S: DataSource> Iterator for RecordIterator<S> {
    type Item = Result<Record>;

    /// Decodes the entry under the cursor. A failed read still consumes the
    /// entry, so the walk always terminates.
    fn next(&mut self) -> Option<Self::Item> {
        let bound = self.bound.as_ref()?;
        if self.index >= self.entries {
            return None;
        }

        let entry = self.index;
        self.index += 1;
        if self.index == self.entries {
            debug!(file_name = %self.file_name, path = %self.path, "reached last entry");
        }

        if let Err(e) = self.source.load_entry(entry) {
            return Some(Err(e));
        }
        let record = bound
            .iter()
            .map(|&leaf| decode_leaf(&self.source, leaf))
            .collect();
        Some(Ok(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }

    /// Skips `n` entries without reading them.
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if self.bound.is_some() {
            self.index = self.index.saturating_add(n).min(self.entries);
        }
        self.next()
    }
}

impl<S: DataSource> ExactSizeIterator for RecordIterator<S> {}

impl<S: DataSource> Drop for RecordIterator<S> {
    fn drop(&mut self) {
        debug!(file_name = %self.file_name, path = %self.path, "releasing tree");
    }
}
