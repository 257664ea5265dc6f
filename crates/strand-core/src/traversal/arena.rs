//! Tree arena: nodes addressed by index, built once by the caller and read-only
//! while tasks run.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::TraversalError;
use crate::typed::ArgLayout;

/// Encoded "no child" in a `NodeRecord`.
const NO_CHILD: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub fn get(self) -> u32 {
        self.0
    }

    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub key: u8,
    pub left: Option<NodeIndex>,
    pub right: Option<NodeIndex>,
}

/// Read-only binary tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeIndex,
}

impl Tree {
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.as_usize())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of one node, as passed to a traversal task.
    pub fn record(&self, index: NodeIndex) -> Result<NodeRecord, TraversalError> {
        self.get(index)
            .map(|node| NodeRecord {
                key: node.key,
                left: node.left,
                right: node.right,
            })
            .ok_or(TraversalError::DanglingChild(index))
    }

    /// Keys in pre-order (node, left subtree, right subtree).
    pub fn keys_preorder(&self) -> Vec<u8> {
        let mut keys = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let Some(node) = self.get(index) else {
                continue;
            };
            keys.push(node.key);
            stack.extend(node.right);
            stack.extend(node.left);
        }
        keys
    }
}

/// Builds a `Tree` bottom-up: children first, root last.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, key: u8) -> NodeIndex {
        self.node(key, None, None)
    }

    pub fn node(&mut self, key: u8, left: Option<NodeIndex>, right: Option<NodeIndex>) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node { key, left, right });
        index
    }

    /// Finish the tree with `root` as its root.
    ///
    /// Fails if any child reference points outside the arena.
    pub fn build(self, root: NodeIndex) -> Result<Tree, TraversalError> {
        let len = self.nodes.len();
        let in_range = |index: NodeIndex| index.as_usize() < len;

        if !in_range(root) {
            return Err(TraversalError::DanglingChild(root));
        }
        for node in &self.nodes {
            for child in [node.left, node.right].into_iter().flatten() {
                if !in_range(child) {
                    return Err(TraversalError::DanglingChild(child));
                }
            }
        }

        Ok(Tree {
            nodes: self.nodes,
            root,
        })
    }
}

/// The 15-node tree `a -> (b, c)`, `b -> (d, e)`, ..., `g -> (n, o)`.
pub fn example_tree() -> Tree {
    let mut builder = TreeBuilder::new();
    let pair = |builder: &mut TreeBuilder, key: u8, left: u8, right: u8| {
        let left = builder.leaf(left);
        let right = builder.leaf(right);
        builder.node(key, Some(left), Some(right))
    };

    let d = pair(&mut builder, b'd', b'h', b'i');
    let e = pair(&mut builder, b'e', b'j', b'k');
    let f = pair(&mut builder, b'f', b'l', b'm');
    let g = pair(&mut builder, b'g', b'n', b'o');
    let b = builder.node(b'b', Some(d), Some(e));
    let c = builder.node(b'c', Some(f), Some(g));
    let a = builder.node(b'a', Some(b), Some(c));

    // Every index above came from this builder.
    Tree {
        nodes: builder.nodes,
        root: a,
    }
}

/// Argument buffer of a traversal task: key, then left and right indices as
/// little-endian `u32`, `u32::MAX` for a missing child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRecord {
    pub key: u8,
    pub left: Option<NodeIndex>,
    pub right: Option<NodeIndex>,
}

fn write_child(child: Option<NodeIndex>, buf: &mut [u8]) {
    let raw = child.map_or(NO_CHILD, NodeIndex::get);
    buf.copy_from_slice(&raw.to_le_bytes());
}

fn read_child(buf: &[u8]) -> Option<NodeIndex> {
    let mut word = [0u8; 4];
    word.copy_from_slice(buf);
    match u32::from_le_bytes(word) {
        NO_CHILD => None,
        raw => Some(NodeIndex(raw)),
    }
}

impl ArgLayout for NodeRecord {
    const SIZE: usize = 9;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = self.key;
        write_child(self.left, &mut buf[1..5]);
        write_child(self.right, &mut buf[5..9]);
    }

    fn read_from(buf: &[u8]) -> Self {
        NodeRecord {
            key: buf[0],
            left: read_child(&buf[1..5]),
            right: read_child(&buf[5..9]),
        }
    }
}
