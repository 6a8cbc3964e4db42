pub mod csv;
pub mod file;
pub mod ipc;
pub mod source;
pub mod tree;

pub use file::TreeFile;
pub use source::{list_leaves, DataSource, Leaf};
pub use tree::ArrowTree;
