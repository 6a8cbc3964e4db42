use std::io;

use arrow::error::ArrowError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Message shared by every selection failure, whatever the culprit.
pub const SELECTION_ERROR: &str = "selection must be a sequence of leaf names";

#[derive(Debug, Error)]
pub enum Error {
    /// The container at `locator` is missing, unreadable or in an unknown format.
    #[error("Could not open file \"{locator}\": {reason}")]
    OpenFile { locator: String, reason: String },

    /// `path` does not name a tree-compatible object inside the container.
    #[error("Could not get tree at \"{path}\": {reason}")]
    NoSuchTree { path: String, reason: String },

    /// The selection is not a list of known leaf names. `name` is the first
    /// offending element, rendered for diagnostics only.
    #[error("{}", SELECTION_ERROR)]
    Selection { name: String },

    #[error("entry {entry} is out of range for a tree with {entries} entries")]
    EntryOutOfRange { entry: usize, entries: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    #[error("I/O error: {0}")]
    IOError(#[from] io::Error),
}

impl Error {
    pub(crate) fn open_file(locator: impl Into<String>, reason: impl ToString) -> Self {
        Error::OpenFile {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn no_such_tree(path: impl Into<String>, reason: impl ToString) -> Self {
        Error::NoSuchTree {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn selection(name: impl Into<String>) -> Self {
        Error::Selection { name: name.into() }
    }

    /// True for failures to open a container or resolve a tree in it.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Error::OpenFile { .. } | Error::NoSuchTree { .. } | Error::IOError(_) | Error::ArrowError(_)
        )
    }

    /// True for a rejected selection.
    pub fn is_selection(&self) -> bool {
        matches!(self, Error::Selection { .. })
    }
}
