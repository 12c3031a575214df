//! Reasons a mutation was refused. A refused mutation never changes state.

use thiserror::Error;
use vedit_core::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("unknown component type: {0}")]
    UnknownComponent(String),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("cannot move {node} into {target}: it would become its own ancestor")]
    CycleDetected { node: NodeId, target: NodeId },
}
