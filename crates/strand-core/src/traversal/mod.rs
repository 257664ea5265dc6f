//! Traversal - 二分木の走査を task に分解する
//!
//! # Task kinds
//! - **TopLevel** (0): root の traverse を launch して待つ
//! - **Traverse** (1): 自分の key の PrintKey、left、right の順に launch
//! - **PrintKey** (2, leaf): key を出力するだけ

mod arena;
mod tasks;

use thiserror::Error;

pub use self::arena::{Node, NodeIndex, NodeRecord, Tree, TreeBuilder, example_tree};
pub use self::tasks::{
    CollectedKeys, KeyOutput, PRINT_KEY, PrintKey, PrintKeyHandler, StdoutKeys, TOP_LEVEL,
    TRAVERSE, TopLevel, TopLevelHandler, TraversalMode, Traverse, TraverseHandler, register,
    top_level,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("node {0} is not in the tree")]
    DanglingChild(NodeIndex),
}
