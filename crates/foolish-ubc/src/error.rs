//! Error types for the execution core.
//!
//! Data-level non-answers are never errors; they are `Unknown` nodes.
//! What remains here is the contract-violation kind ([`NodeError`]) and the
//! runaway-evaluation kind ([`RuntimeFault`]).

use crate::memory::MemoryId;
use crate::node::{NodeIndex, UnknownReason};
use thiserror::Error;

/// A caller or the core itself broke the node contract.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("node {0:?} is not in the arena")]
    UnknownNode(NodeIndex),

    #[error("scope {0:?} is not in the arena")]
    UnknownScope(MemoryId),

    #[error("node {0:?} has not finished evaluating")]
    NotFinished(NodeIndex),

    #[error("{kind} node does not denote an integer value")]
    NotAValue { kind: &'static str },

    #[error("value is not knowable: {reason}")]
    NotKnowable { reason: UnknownReason },

    #[error("{kind} node has no scope")]
    NotABlock { kind: &'static str },

    #[error("{kind} node has no work queue")]
    NotComposite { kind: &'static str },

    #[error("{kind} node has no match list")]
    NotAGlobalSearch { kind: &'static str },

    #[error("finished node {0:?} was still queued for stepping")]
    FinishedInQueue(NodeIndex),

    #[error("binding `{identifier}` at line {line} does not follow line {last}")]
    BindingOutOfOrder {
        identifier: String,
        line: u32,
        last: u32,
    },

    #[error("node {0:?} was built without syntax")]
    MissingSyntax(NodeIndex),
}

/// Evaluation could not be brought to completion.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeFault {
    /// The step bound ran out. `node` is the partially evaluated root; it is
    /// left in a consistent state and can be driven further.
    #[error("evaluation did not finish within {limit} steps")]
    StepLimitExceeded { limit: u64, node: NodeIndex },

    #[error(transparent)]
    Contract(#[from] NodeError),
}
