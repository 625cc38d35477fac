//! IR node definitions.
//!
//! Nodes live in a [`NodeArena`](crate::NodeArena) and refer to each other
//! through [`NodeIndex`]. A node owns the children it constructs (operands,
//! statements, branches); references to bindings found through a scope
//! (identifier targets, search hits) are non-owning.

use crate::identifier::CharacterizedIdentifier;
use crate::memory::MemoryId;
use crate::mind::Mind;
use foolish_ast::{BinaryOp, ExprRef, SearchOperator, UnaryOp};
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

/// Index of a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: Self = Self(u32::MAX);

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Evaluation phase of a node.
///
/// `Constanic` is "constant in context": finished, but the value still
/// depends on something unbound, so re-evaluating the same node somewhere
/// else may produce a different answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Nyes {
    Uninitialized,
    Initialized,
    Evaluating,
    Constanic,
    Constant,
}

impl Nyes {
    pub const fn needs_step(self) -> bool {
        !matches!(self, Self::Constanic | Self::Constant)
    }

    pub const fn finished(is_abstract: bool) -> Self {
        if is_abstract {
            Self::Constanic
        } else {
            Self::Constant
        }
    }
}

/// Where a node resolves identifiers: a scope and a line position in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Context {
    pub memory: MemoryId,
    pub line: u32,
}

impl Context {
    pub const fn new(memory: MemoryId, line: u32) -> Self {
        Self { memory, line }
    }
}

/// Why a node has no knowable value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum UnknownReason {
    /// A literal `???` in the source.
    Literal,
    /// An identifier no scope binds.
    Unbound(String),
    /// An operator with an abstract operand.
    AbstractOperand,
    /// An operator applied to a brane.
    NotAnInteger,
    NoMatchingBranch,
    NotFound(String),
    /// A search anchored on something that is not a brane.
    NotABrane,
    InvalidPattern(String),
    SeekOutOfBounds(i64),
    InvalidSeekOffset(i64),
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => f.write_str("unknown literal"),
            Self::Unbound(name) => write!(f, "`{name}` is not bound"),
            Self::AbstractOperand => f.write_str("operand is not knowable"),
            Self::NotAnInteger => f.write_str("operand is not an integer"),
            Self::NoMatchingBranch => f.write_str("No matching condition in if-elif chain"),
            Self::NotFound(pattern) => write!(f, "no binding matches `{pattern}`"),
            Self::NotABrane => f.write_str("search anchor is not a brane"),
            Self::InvalidPattern(err) => write!(f, "invalid search pattern: {err}"),
            Self::SeekOutOfBounds(offset) => write!(f, "seek offset {offset} is out of bounds"),
            Self::InvalidSeekOffset(offset) => {
                write!(f, "unanchored seek offset {offset} must be negative")
            }
        }
    }
}

// =============================================================================
// Variant payloads
// =============================================================================

#[derive(Clone, Debug)]
pub struct BlockNode {
    pub characterization: String,
    pub memory: MemoryId,
    /// One child per statement, in order. Never shrinks.
    pub statements: Vec<NodeIndex>,
    /// Statements that still need steps.
    pub mind: Mind,
}

#[derive(Clone, Debug)]
pub struct AssignmentNode {
    pub identifier: CharacterizedIdentifier,
    pub expr: NodeIndex,
    pub mind: Mind,
}

#[derive(Clone, Debug)]
pub struct BinaryNode {
    pub op: BinaryOp,
    pub operands: SmallVec<[NodeIndex; 2]>,
    pub mind: Mind,
    pub result: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct UnaryNode {
    pub op: UnaryOp,
    pub operand: NodeIndex,
    pub mind: Mind,
    pub result: NodeIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IfState {
    EvaluatingCondition,
    ConditionTrue,
    ConditionFalse,
    Done,
}

#[derive(Clone, Debug)]
pub struct ConditionalNode {
    pub state: IfState,
    /// Stage currently being decided; `stages.len()` once the else path runs.
    pub stage: usize,
    pub condition: NodeIndex,
    pub branch: NodeIndex,
    /// Every condition and branch constructed so far.
    pub owned: SmallVec<[NodeIndex; 4]>,
    pub result: NodeIndex,
}

impl Default for ConditionalNode {
    fn default() -> Self {
        Self {
            state: IfState::EvaluatingCondition,
            stage: 0,
            condition: NodeIndex::NONE,
            branch: NodeIndex::NONE,
            owned: SmallVec::new(),
            result: NodeIndex::NONE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct IdentifierNode {
    pub identifier: CharacterizedIdentifier,
    /// The bound node, once resolved. Not owned.
    pub target: NodeIndex,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchKind {
    Query {
        operator: SearchOperator,
        pattern: String,
    },
    Seek(i64),
    /// Relative to the statement holding the search; no anchor.
    RelativeSeek(i64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Pending,
    Single(NodeIndex),
    All(Vec<NodeIndex>),
}

#[derive(Clone, Debug)]
pub struct SearchNode {
    pub kind: SearchKind,
    pub anchor: NodeIndex,
    pub mind: Mind,
    pub outcome: SearchOutcome,
    /// Unknown node this search produced for a miss; owned.
    pub miss: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct DetachmentNode {
    pub defaults: SmallVec<[NodeIndex; 2]>,
    pub body: NodeIndex,
    pub mind: Mind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ReplayPhase {
    /// Waiting for the original to settle.
    Observing,
    /// Driving the re-scoped replica.
    Replaying,
    /// The original settled to a concrete value; nothing to replay.
    Done,
}

#[derive(Clone, Debug)]
pub struct ReplayNode {
    pub original: NodeIndex,
    /// Whether this node constructed (and therefore steps) the original.
    pub owns_original: bool,
    pub target: Context,
    pub phase: ReplayPhase,
    pub replica: NodeIndex,
}

// =============================================================================
// Node
// =============================================================================

#[derive(Clone, Debug)]
pub enum NodeKind {
    Value(i64),
    Unknown(UnknownReason),
    Block(BlockNode),
    Assignment(AssignmentNode),
    Binary(BinaryNode),
    Unary(UnaryNode),
    Conditional(ConditionalNode),
    Identifier(IdentifierNode),
    /// `↑`: the enclosing block. Not owned.
    SearchUp(NodeIndex),
    Search(SearchNode),
    Detachment(DetachmentNode),
    Replay(ReplayNode),
}

impl NodeKind {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Unknown(_) => "unknown",
            Self::Block(_) => "block",
            Self::Assignment(_) => "assignment",
            Self::Binary(_) => "binary",
            Self::Unary(_) => "unary",
            Self::Conditional(_) => "conditional",
            Self::Identifier(_) => "identifier",
            Self::SearchUp(_) => "search_up",
            Self::Search(_) => "search",
            Self::Detachment(_) => "detachment",
            Self::Replay(_) => "replay",
        }
    }

    pub const fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub nyes: Nyes,
    pub context: Context,
    /// Owning node; `NONE` for roots.
    pub parent: NodeIndex,
    /// Syntax this node was built from, when it was built from syntax.
    pub syntax: Option<ExprRef>,
}

impl Node {
    pub const fn needs_step(&self) -> bool {
        self.nyes.needs_step()
    }

    pub fn is_abstract(&self) -> bool {
        self.nyes != Nyes::Constant
    }
}
