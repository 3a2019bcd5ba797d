//! Arena-based binary trees with depth annotation and diameter analysis.
//!
//! Build a [`BinaryTree`] with `create_node`/`attach`, then run
//! [`DepthDistanceAnalyzer`] over it to get a per-node [`DepthDistance`]
//! mapping and the tree's diameter. Analysis results are derived data,
//! recomputed per pass; they never live on the nodes themselves.

pub mod analyzer;
pub mod arena;
pub mod errors;
pub mod tree_traits;
pub mod util;

pub use analyzer::{DepthDistance, DepthDistanceAnalyzer, TreeMetrics};
pub use arena::{BinaryTree, NodeId, PostOrderIterator, Side, TreeIterator, TreeNode};
pub use errors::{TreeError, TreeResult};
pub use tree_traits::TreeRender;
