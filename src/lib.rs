//! Sequential, leaf-selective access to the entries of tree-structured data files.
//!
//! A [`RecordIterator`] opens one tree, binds a selection of leaf names and
//! yields one [`Record`] per entry, with scalar leaves as numbers and array
//! leaves as lists of numbers.

pub mod config;
pub mod datasource;
pub mod error;
pub mod iterator;
pub mod record;
mod util;

pub use config::{CsvOptions, IteratorConfig};
pub use datasource::{list_leaves, ArrowTree, DataSource, Leaf, TreeFile};
pub use error::{Error, Result};
pub use iterator::RecordIterator;
pub use record::{Record, Value};
