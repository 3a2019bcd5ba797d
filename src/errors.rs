use thiserror::Error;

use crate::arena::{NodeId, Side};

/// Errors raised by structural mutation and analysis.
///
/// All of these are contract violations reported synchronously at the point
/// of the offending call; none are retried internally. A failed operation
/// leaves the tree unchanged.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("cycle detected between {parent:?} and {child:?}")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("{side} slot of {parent:?} is already occupied, detach it first")]
    SlotOccupied { parent: NodeId, side: Side },

    #[error("node {0:?} is already attached to a parent, detach it first")]
    AlreadyAttached(NodeId),

    #[error("node {0:?} does not belong to this tree")]
    InvalidReference(NodeId),
}

pub type TreeResult<T> = Result<T, TreeError>;
