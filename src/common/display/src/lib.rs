//! Display utilities shared across SAQ crates.
//!
//! Currently this is the [`TreeNode`]/[`DisplayTree`] pair used to render
//! hierarchical diagnostics such as the query profiler breakdown.

mod tree;

pub use tree::{DisplayTree, TreeNode};
