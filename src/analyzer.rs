use std::collections::{HashMap, HashSet};
use tracing::instrument;

use crate::arena::{BinaryTree, NodeId};
use crate::errors::{TreeError, TreeResult};

/// Per-node analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthDistance {
    /// Edge count from the analysis root down to this node
    pub depth: usize,
    /// Edge count of the longest path passing through this node,
    /// combining its two child heights
    pub distance: usize,
}

/// Result of one analysis pass over a tree.
///
/// Derived data: recomputed from scratch on every pass, never patched
/// incrementally. Keys are node identities, so duplicate values across
/// nodes cannot collide.
#[derive(Debug, Default)]
pub struct TreeMetrics {
    metrics: HashMap<NodeId, DepthDistance>,
    diameter: usize,
}

impl TreeMetrics {
    pub fn get(&self, id: NodeId) -> Option<&DepthDistance> {
        self.metrics.get(&id)
    }

    /// Maximum distance over all nodes: the longest path between any
    /// two nodes in the tree. 0 for empty and single-node trees.
    pub fn diameter(&self) -> usize {
        self.diameter
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &DepthDistance)> {
        self.metrics.iter()
    }
}

/// Walks a tree bottom-up and annotates every node with its depth and
/// distance, folding the global diameter along the way.
#[derive(Debug, Default)]
pub struct DepthDistanceAnalyzer;

impl DepthDistanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes the whole tree from its root.
    ///
    /// An empty tree yields empty metrics and diameter 0.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn analyze(&self, tree: &BinaryTree) -> TreeResult<TreeMetrics> {
        match tree.root() {
            Some(root) => self.analyze_from(tree, root),
            None => Ok(TreeMetrics::default()),
        }
    }

    /// Analyzes the subtree rooted at `root` as a tree of its own, so
    /// `root` gets depth 0. Useful for detached subtrees.
    ///
    /// Single combined traversal on an explicit work stack of
    /// (node, pushed-by, depth, expanded) frames: depth is threaded top-down on the
    /// first visit, heights and distances are folded bottom-up on the
    /// second, after the children have been processed. O(n) time, stack
    /// bounded by the tree height, no recursion.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn analyze_from(&self, tree: &BinaryTree, root: NodeId) -> TreeResult<TreeMetrics> {
        if !tree.contains(root) {
            return Err(TreeError::InvalidReference(root));
        }

        let mut metrics: HashMap<NodeId, DepthDistance> = HashMap::new();
        // Subtree heights, -1 for an absent child so a leaf reports 0
        let mut heights: HashMap<NodeId, i64> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut diameter = 0usize;

        // Frames carry the node that pushed them so a revisit can name both
        // ends of the offending link.
        let mut stack: Vec<(NodeId, Option<NodeId>, usize, bool)> = vec![(root, None, 0, false)];
        while let Some((id, pushed_by, depth, expanded)) = stack.pop() {
            let node = tree
                .get_node(id)
                .ok_or(TreeError::InvalidReference(id))?;
            if !expanded {
                // Construction keeps the structure acyclic, but a revisit
                // here must fail instead of looping forever.
                if !visited.insert(id) {
                    return Err(TreeError::Cycle {
                        parent: pushed_by.unwrap_or(id),
                        child: id,
                    });
                }
                stack.push((id, pushed_by, depth, true));
                if let Some(right) = node.right {
                    stack.push((right, Some(id), depth + 1, false));
                }
                if let Some(left) = node.left {
                    stack.push((left, Some(id), depth + 1, false));
                }
            } else {
                let left_height = node
                    .left
                    .and_then(|left| heights.get(&left).copied())
                    .unwrap_or(-1);
                let right_height = node
                    .right
                    .and_then(|right| heights.get(&right).copied())
                    .unwrap_or(-1);

                heights.insert(id, 1 + left_height.max(right_height));

                let distance = ((left_height + 1) + (right_height + 1)) as usize;
                diameter = diameter.max(distance);
                metrics.insert(id, DepthDistance { depth, distance });
            }
        }

        Ok(TreeMetrics { metrics, diameter })
    }
}
