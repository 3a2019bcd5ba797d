use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

use crate::errors::{TreeError, TreeResult};

/// Identity of a node within its tree.
///
/// Generational: once a node is removed its id never resolves again, so ids
/// of freed nodes cannot alias later allocations.
pub type NodeId = Index;

/// Selects one of the two child slots of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Tree node in the arena-based binary hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    /// Integer payload carried by this node
    pub value: i64,
    /// Index of the parent node in the arena, None for roots
    pub parent: Option<NodeId>,
    /// Left child slot
    pub left: Option<NodeId>,
    /// Right child slot
    pub right: Option<NodeId>,
}

impl TreeNode {
    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<NodeId> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Arena-based binary tree over integer values.
///
/// Uses a generational arena for memory-safe node references and O(1)
/// lookups. Links are parent-to-child only; every node hangs under at most
/// one parent slot, which keeps the structure acyclic as long as `attach`
/// is the only way links are created.
#[derive(Debug)]
pub struct BinaryTree {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node, None for empty trees
    root: Option<NodeId>,
}

impl Default for BinaryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Allocates a free-standing node with no children.
    ///
    /// The first node created into an empty tree becomes the root; later
    /// nodes join the structure via `attach`.
    #[instrument(level = "trace", skip(self))]
    pub fn create_node(&mut self, value: i64) -> NodeId {
        let id = self.arena.insert(TreeNode {
            value,
            parent: None,
            left: None,
            right: None,
        });
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    pub fn attach_left(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.attach(parent, Side::Left, child)
    }

    pub fn attach_right(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.attach(parent, Side::Right, child)
    }

    /// Links `child` into the given slot of `parent`.
    ///
    /// All checks run before any mutation, so a failed attach leaves both
    /// nodes untouched. Attaching the child that already occupies the slot
    /// is a no-op; overwriting a different child requires an explicit
    /// `detach` first, which keeps subtrees from being orphaned silently.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, parent: NodeId, side: Side, child: NodeId) -> TreeResult<()> {
        if !self.arena.contains(parent) {
            return Err(TreeError::InvalidReference(parent));
        }
        if !self.arena.contains(child) {
            return Err(TreeError::InvalidReference(child));
        }

        match self.arena[parent].child(side) {
            Some(existing) if existing == child => return Ok(()),
            Some(_) => return Err(TreeError::SlotOccupied { parent, side }),
            None => {}
        }
        if parent == child {
            return Err(TreeError::Cycle { parent, child });
        }

        // Walk the ancestor chain of `parent`: `child` showing up there means
        // the attach would close a loop. This must run before the
        // single-parent check, since a mid-chain ancestor is itself attached
        // somewhere but hanging it below itself is a cycle, not a
        // detach-first situation. The topmost ancestor is kept for the root
        // fixup below.
        let mut top = parent;
        let mut cursor = self.arena[parent].parent;
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(TreeError::Cycle { parent, child });
            }
            top = ancestor;
            cursor = self.arena[ancestor].parent;
        }
        if self.arena[child].parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }

        *self.arena[parent].slot_mut(side) = Some(child);
        self.arena[child].parent = Some(parent);

        // Hanging the current root under another node moves the root up to
        // the top of that node's chain.
        if self.root == Some(child) {
            self.root = Some(top);
        }
        Ok(())
    }

    /// Severs the link in the given slot of `parent`.
    ///
    /// Returns the detached subtree's root id, or None when the slot was
    /// already empty. The subtree stays in the arena as an independent tree;
    /// tracking the returned id is the caller's responsibility.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, parent: NodeId, side: Side) -> TreeResult<Option<NodeId>> {
        if !self.arena.contains(parent) {
            return Err(TreeError::InvalidReference(parent));
        }
        let detached = self.arena[parent].slot_mut(side).take();
        if let Some(child) = detached {
            self.arena[child].parent = None;
        }
        Ok(detached)
    }

    /// Tears down the subtree rooted at `id`, freeing its arena slots.
    ///
    /// Severs the incoming parent link first when the subtree is still
    /// attached. Returns the number of nodes removed; all their ids become
    /// stale and stop resolving.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<usize> {
        if !self.arena.contains(id) {
            return Err(TreeError::InvalidReference(id));
        }

        if let Some(parent) = self.arena[id].parent {
            if self.arena[parent].left == Some(id) {
                self.arena[parent].left = None;
            } else if self.arena[parent].right == Some(id) {
                self.arena[parent].right = None;
            }
            self.arena[id].parent = None;
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                removed += 1;
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }

        if self.root == Some(id) {
            self.root = None;
        }
        Ok(removed)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id)
    }

    pub fn value(&self, id: NodeId) -> Option<i64> {
        self.arena.get(id).map(|node| node.value)
    }

    pub fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.arena.get(id).and_then(|node| node.child(side))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Edge count from the root down to the deepest leaf, None for the
    /// empty tree. Explicit work stack, so skewed trees cannot overflow
    /// the call stack.
    #[instrument(level = "debug", skip(self))]
    pub fn height(&self) -> Option<usize> {
        self.root.map(|root| {
            let mut max_depth = 0;
            let mut stack = vec![(root, 0usize)];
            while let Some((id, depth)) = stack.pop() {
                max_depth = max_depth.max(depth);
                if let Some(node) = self.arena.get(id) {
                    if let Some(left) = node.left {
                        stack.push((left, depth + 1));
                    }
                    if let Some(right) = node.right {
                        stack.push((right, depth + 1));
                    }
                }
            }
            max_depth
        })
    }

    /// Collects all leaf node ids, left to right.
    ///
    /// Empty trees return an empty vector.
    #[instrument(level = "debug", skip(self))]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }
}

/// Pre-order traversal from the root.
pub struct TreeIterator<'a> {
    tree: &'a BinaryTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a BinaryTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current) {
                // Push right first so the left child comes off the stack first
                if let Some(right) = node.right {
                    self.stack.push(right);
                }
                if let Some(left) = node.left {
                    self.stack.push(left);
                }
                return Some((current, node));
            }
        }
        None
    }
}

/// Post-order traversal from the root: children before their parent.
pub struct PostOrderIterator<'a> {
    tree: &'a BinaryTree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a BinaryTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push((root, false));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, expanded)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current) {
                if !expanded {
                    self.stack.push((current, true));
                    if let Some(right) = node.right {
                        self.stack.push((right, false));
                    }
                    if let Some(left) = node.left {
                        self.stack.push((left, false));
                    }
                } else {
                    return Some((current, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_occupied_slot_when_attaching_different_child_then_fails() {
        let mut tree = BinaryTree::new();
        let root = tree.create_node(1);
        let a = tree.create_node(2);
        let b = tree.create_node(3);
        tree.attach_left(root, a).unwrap();

        let result = tree.attach_left(root, b);
        assert_eq!(
            result,
            Err(TreeError::SlotOccupied {
                parent: root,
                side: Side::Left
            })
        );
        // failed attach leaves everything untouched
        assert_eq!(tree.get_node(root).unwrap().left, Some(a));
        assert!(tree.get_node(b).unwrap().parent.is_none());
    }

    #[test]
    fn given_attached_child_when_reattaching_same_slot_then_noop() {
        let mut tree = BinaryTree::new();
        let root = tree.create_node(1);
        let a = tree.create_node(2);
        tree.attach_left(root, a).unwrap();

        assert!(tree.attach_left(root, a).is_ok());
        assert_eq!(tree.get_node(root).unwrap().left, Some(a));
    }

    #[test]
    fn given_ancestor_as_child_when_attaching_then_reports_cycle() {
        let mut tree = BinaryTree::new();
        let root = tree.create_node(1);
        let mid = tree.create_node(2);
        let leaf = tree.create_node(3);
        tree.attach_left(root, mid).unwrap();
        tree.attach_left(mid, leaf).unwrap();

        assert_eq!(
            tree.attach_right(leaf, root),
            Err(TreeError::Cycle {
                parent: leaf,
                child: root
            })
        );
        assert_eq!(
            tree.attach_right(root, root),
            Err(TreeError::Cycle {
                parent: root,
                child: root
            })
        );
    }

    #[test]
    fn given_mid_chain_ancestor_as_child_when_attaching_then_reports_cycle() {
        let mut tree = BinaryTree::new();
        let root = tree.create_node(1);
        let mid = tree.create_node(2);
        let leaf = tree.create_node(3);
        tree.attach_left(root, mid).unwrap();
        tree.attach_left(mid, leaf).unwrap();

        // mid is attached under root, but ancestry wins over the
        // single-parent check
        assert_eq!(
            tree.attach_right(leaf, mid),
            Err(TreeError::Cycle {
                parent: leaf,
                child: mid
            })
        );
        // links are untouched after the failed attach
        assert_eq!(tree.child(root, Side::Left), Some(mid));
        assert_eq!(tree.child(leaf, Side::Right), None);
        assert_eq!(tree.get_node(mid).unwrap().parent, Some(root));
    }

    #[test]
    fn given_node_with_parent_when_attaching_elsewhere_then_requires_detach() {
        let mut tree = BinaryTree::new();
        let root = tree.create_node(1);
        let a = tree.create_node(2);
        let b = tree.create_node(3);
        tree.attach_left(root, a).unwrap();
        tree.attach_right(root, b).unwrap();

        assert_eq!(tree.attach_left(b, a), Err(TreeError::AlreadyAttached(a)));

        let moved = tree.detach(root, Side::Left).unwrap();
        assert_eq!(moved, Some(a));
        tree.attach_left(b, a).unwrap();
        assert_eq!(tree.get_node(b).unwrap().left, Some(a));
    }

    #[test]
    fn given_root_attached_under_other_node_when_attaching_then_root_moves_up() {
        let mut tree = BinaryTree::new();
        let old_root = tree.create_node(1);
        let new_root = tree.create_node(2);

        tree.attach_left(new_root, old_root).unwrap();
        assert_eq!(tree.root(), Some(new_root));
    }

    #[test]
    fn given_removed_subtree_when_using_stale_id_then_invalid_reference() {
        let mut tree = BinaryTree::new();
        let root = tree.create_node(1);
        let a = tree.create_node(2);
        tree.attach_left(root, a).unwrap();

        let removed = tree.remove_subtree(a).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(a));
        assert_eq!(
            tree.attach_left(root, a),
            Err(TreeError::InvalidReference(a))
        );
    }
}
