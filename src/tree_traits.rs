use termtree::Tree;

use crate::arena::{BinaryTree, NodeId};

/// Rendering into termtree's display structure.
pub trait TreeRender {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeRender for BinaryTree {
    fn to_tree_string(&self) -> Tree<String> {
        if let Some(root_id) = self.root() {
            let mut tree = Tree::new(label(self, root_id));

            fn build(source: &BinaryTree, id: NodeId, parent_tree: &mut Tree<String>) {
                if let Some(node) = source.get_node(id) {
                    for child_id in [node.left, node.right].into_iter().flatten() {
                        let mut child_tree = Tree::new(label(source, child_id));
                        build(source, child_id, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }

            build(self, root_id, &mut tree);
            tree
        } else {
            Tree::new("Empty tree".to_string())
        }
    }
}

fn label(tree: &BinaryTree, id: NodeId) -> String {
    tree.get_node(id)
        .map(|node| node.value.to_string())
        .unwrap_or_default()
}
