/// Data model for the DiskMapper entry tree.
///
/// Re-exports the arena-allocated tree structure and supporting types.
pub mod entry;
pub mod size;
pub mod tree;

pub use entry::{Children, Entry, NodeIndex};
pub use tree::EntryTree;
