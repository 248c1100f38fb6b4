//! Red-black tree index
//!
//! Nodes live in a flat arena (`Vec<Node>`) and refer to each other by
//! index, so parent links need no shared ownership. Nodes are never removed,
//! which keeps every index stable for the lifetime of the tree.
//!
//! All walks (insert, lookup, traversal, validation) are iterative.

use std::cmp::Ordering;

use thiserror::Error;

use crate::entry::{compare_keys, Comparator, Entry};

/// Index of a node in the arena
type NodeId = usize;

/// Node color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    color: Color,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

/// A broken red-black or search-tree property, reported by [`RbTree::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("root node is red")]
    RedRoot,

    #[error("red node {key:?} has a red child")]
    RedRedEdge { key: Vec<u8> },

    #[error("black height {found} below {key:?}, expected {expected}")]
    BlackHeightMismatch {
        key: Vec<u8>,
        expected: usize,
        found: usize,
    },

    #[error("key {key:?} is not greater than its in-order predecessor")]
    OutOfOrder { key: Vec<u8> },

    #[error("node {key:?} does not point back to its parent")]
    BrokenParentLink { key: Vec<u8> },

    #[error("{reachable} nodes reachable from the root, {stored} stored")]
    Unreachable { reachable: usize, stored: usize },
}

/// Self-balancing binary search tree keyed by byte strings
pub struct RbTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    compare: Comparator,
}

impl RbTree {
    /// Create an empty tree ordered by lexicographic byte comparison
    pub fn new() -> Self {
        Self::with_comparator(compare_keys)
    }

    /// Create an empty tree with a custom key ordering
    pub fn with_comparator(compare: Comparator) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            compare,
        }
    }

    /// Insert a key, or overwrite the value of an existing equal key.
    ///
    /// Returns the previous value on overwrite; the tree shape and size are
    /// unchanged in that case.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cursor = self.root;

        while let Some(id) = cursor {
            parent = Some(id);
            match (self.compare)(&key, &self.nodes[id].key) {
                Ordering::Less => {
                    side = Side::Left;
                    cursor = self.nodes[id].left;
                }
                Ordering::Greater => {
                    side = Side::Right;
                    cursor = self.nodes[id].right;
                }
                Ordering::Equal => {
                    return Some(std::mem::replace(&mut self.nodes[id].value, value));
                }
            }
        }

        let id = self.nodes.len();
        self.nodes.push(Node {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
            parent,
        });

        match parent {
            None => self.root = Some(id),
            Some(p) => self.set_child(p, side, Some(id)),
        }

        self.insert_fixup(id);
        None
    }

    /// Look up a key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            match (self.compare)(key, &node.key) {
                Ordering::Less => cursor = node.left,
                Ordering::Greater => cursor = node.right,
                Ordering::Equal => return Some(node.value.as_slice()),
            }
        }
        None
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys stored
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Longest root-to-leaf path, counted in nodes (0 for an empty tree)
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[id];
            for child in [node.left, node.right].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Color of the root node, if any
    pub fn root_color(&self) -> Option<Color> {
        self.root.map(|id| self.nodes[id].color)
    }

    /// In-order iterator over `(key, value)` pairs
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Every stored pair, copied out in key order
    pub fn to_entries(&self) -> Vec<Entry> {
        self.iter().map(Entry::from).collect()
    }

    /// Check every red-black and search-tree property.
    ///
    /// Returns the black height of the tree (black nodes on any root-to-nil
    /// path) when all properties hold.
    pub fn validate(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            return Ok(0);
        };

        if self.nodes[root].color == Color::Red {
            return Err(InvariantViolation::RedRoot);
        }

        // Parent links and red-red edges
        let mut reachable = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            reachable += 1;
            let node = &self.nodes[id];
            for child in [node.left, node.right].into_iter().flatten() {
                if self.nodes[child].parent != Some(id) {
                    return Err(InvariantViolation::BrokenParentLink {
                        key: self.nodes[child].key.clone(),
                    });
                }
                if node.color == Color::Red && self.nodes[child].color == Color::Red {
                    return Err(InvariantViolation::RedRedEdge {
                        key: node.key.clone(),
                    });
                }
                stack.push(child);
            }
        }
        if reachable != self.nodes.len() {
            return Err(InvariantViolation::Unreachable {
                reachable,
                stored: self.nodes.len(),
            });
        }

        // Strictly increasing in-order keys
        let mut previous: Option<&[u8]> = None;
        for (key, _) in self.iter() {
            if let Some(prev) = previous {
                if (self.compare)(prev, key) != Ordering::Less {
                    return Err(InvariantViolation::OutOfOrder { key: key.to_vec() });
                }
            }
            previous = Some(key);
        }

        // Equal black count from the root to every nil leaf
        let mut expected = None;
        for (id, node) in self.nodes.iter().enumerate() {
            if node.left.is_some() && node.right.is_some() {
                continue;
            }
            let found = self.black_depth(id);
            match expected {
                None => expected = Some(found),
                Some(expected) if expected != found => {
                    return Err(InvariantViolation::BlackHeightMismatch {
                        key: node.key.clone(),
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(expected.unwrap_or(0))
    }

    // =========================================================================
    // Balancing
    // =========================================================================

    fn insert_fixup(&mut self, mut node: NodeId) {
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grandparent) = self.nodes[parent].parent else {
                break;
            };

            let parent_side = self.side_of(grandparent, parent);
            let uncle = self.child(grandparent, parent_side.opposite());

            if let Some(uncle) = uncle.filter(|&u| self.nodes[u].color == Color::Red) {
                self.nodes[parent].color = Color::Black;
                self.nodes[uncle].color = Color::Black;
                self.nodes[grandparent].color = Color::Red;
                node = grandparent;
                continue;
            }

            // Inner child: rotate it up through the parent so it becomes the
            // outer case with the roles of node and parent swapped.
            let (top, bottom) = if self.side_of(parent, node) != parent_side {
                self.rotate(parent, parent_side);
                (node, parent)
            } else {
                (parent, node)
            };

            self.nodes[top].color = Color::Black;
            self.nodes[grandparent].color = Color::Red;
            self.rotate(grandparent, parent_side.opposite());
            node = bottom;
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    /// Rotate `x` down towards `dir`; its child on the opposite side takes
    /// its place. `Side::Left` is a left rotation.
    fn rotate(&mut self, x: NodeId, dir: Side) {
        let Some(y) = self.child(x, dir.opposite()) else {
            return;
        };

        let inner = self.child(y, dir);
        self.set_child(x, dir.opposite(), inner);
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }

        let x_parent = self.nodes[x].parent;
        self.nodes[y].parent = x_parent;
        match x_parent {
            None => self.root = Some(y),
            Some(p) => {
                let side = self.side_of(p, x);
                self.set_child(p, side, Some(y));
            }
        }

        self.set_child(y, dir, Some(x));
        self.nodes[x].parent = Some(y);
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.nodes[id].left,
            Side::Right => self.nodes[id].right,
        }
    }

    fn set_child(&mut self, id: NodeId, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.nodes[id].left = child,
            Side::Right => self.nodes[id].right = child,
        }
    }

    /// Which side of `parent` the node `child` hangs on
    fn side_of(&self, parent: NodeId, child: NodeId) -> Side {
        if self.nodes[parent].left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Black nodes from `id` up to and including the root
    fn black_depth(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.nodes[current].color == Color::Black {
                count += 1;
            }
            cursor = self.nodes[current].parent;
        }
        count
    }
}

impl Default for RbTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RbTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v.len())))
            .finish()
    }
}

/// In-order iterator over an [`RbTree`]
pub struct Iter<'a> {
    tree: &'a RbTree,
    stack: Vec<NodeId>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut cursor: Option<NodeId>) {
        while let Some(id) = cursor {
            self.stack.push(id);
            cursor = self.tree.nodes[id].left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        let node = &tree.nodes[id];
        self.push_left_spine(node.right);
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}
