//! The brane computer: arenas plus the public evaluation interface.
//!
//! Construction, stepping, searching and replay are split across
//! `state_*.rs` files, each adding an `impl Ubc` block.

use crate::arena::NodeArena;
use crate::error::{NodeError, RuntimeFault};
use crate::identifier::CharacterizedIdentifier;
use crate::memory::{BraneMemory, MemoryArena, MemoryId};
use crate::node::{Context, Node, NodeIndex, NodeKind, ReplayPhase, SearchOutcome, UnknownReason};
use foolish_ast::ExprRef;
use foolish_common::limits;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

/// Evaluation options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UbcOptions {
    /// Root steps granted by [`Ubc::run`].
    pub max_steps: u64,
    /// Emit a trace event for every root step.
    pub trace_steps: bool,
}

impl Default for UbcOptions {
    fn default() -> Self {
        Self {
            max_steps: limits::DEFAULT_MAX_STEPS,
            trace_steps: false,
        }
    }
}

/// Number of root steps a run took.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StepCount(pub u64);

impl fmt::Display for StepCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} steps", self.0)
    }
}

/// Owns the nodes and scopes of one evaluation run.
#[derive(Clone, Debug, Default)]
pub struct Ubc {
    pub(crate) nodes: NodeArena,
    pub(crate) memories: MemoryArena,
    pub(crate) options: UbcOptions,
}

impl Ubc {
    pub fn new() -> Self {
        Self::with_options(UbcOptions::default())
    }

    pub fn with_options(options: UbcOptions) -> Self {
        Self {
            nodes: NodeArena::new(),
            memories: MemoryArena::new(),
            options,
        }
    }

    pub const fn options(&self) -> &UbcOptions {
        &self.options
    }

    pub const fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    pub const fn memories(&self) -> &MemoryArena {
        &self.memories
    }

    /// Direct scope access, for embedders that bind values themselves.
    pub fn memories_mut(&mut self) -> &mut MemoryArena {
        &mut self.memories
    }

    pub fn node(&self, idx: NodeIndex) -> Result<&Node, NodeError> {
        self.nodes.node(idx)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Wrap `expr` in a node with a fresh, empty root scope. Nothing is
    /// evaluated.
    pub fn build(&mut self, expr: &ExprRef) -> NodeIndex {
        let root = self.memories.alloc_root();
        self.alloc_from_syntax(expr, Context::new(root, 0), NodeIndex::NONE)
    }

    /// Wrap `expr` so that its identifiers resolve in `memory` as seen from
    /// `line`.
    pub fn build_in(&mut self, expr: &ExprRef, memory: MemoryId, line: u32) -> NodeIndex {
        self.alloc_from_syntax(expr, Context::new(memory, line), NodeIndex::NONE)
    }

    // =========================================================================
    // Driving
    // =========================================================================

    /// Step `root` until it finishes, using the configured step bound.
    pub fn run(&mut self, root: NodeIndex) -> Result<StepCount, RuntimeFault> {
        self.run_to_completion(root, self.options.max_steps)
    }

    /// Step `root` until it finishes or `max_steps` steps have been taken.
    ///
    /// Running out of steps leaves every node consistent; calling again
    /// continues where the previous run stopped.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn run_to_completion(
        &mut self,
        root: NodeIndex,
        max_steps: u64,
    ) -> Result<StepCount, RuntimeFault> {
        self.nodes.node(root)?;
        let mut steps = 0u64;
        while self.nodes.needs_step(root) {
            if steps >= max_steps {
                warn!(?root, limit = max_steps, "step limit exceeded");
                return Err(RuntimeFault::StepLimitExceeded {
                    limit: max_steps,
                    node: root,
                });
            }
            if self.options.trace_steps {
                trace!(step = steps, "root step");
            }
            self.step(root)?;
            steps += 1;
        }
        debug!(
            steps,
            is_abstract = self.is_abstract(root),
            nodes = self.nodes.len(),
            "evaluation finished"
        );
        Ok(StepCount(steps))
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn needs_step(&self, idx: NodeIndex) -> bool {
        self.nodes.needs_step(idx)
    }

    pub fn is_abstract(&self, idx: NodeIndex) -> bool {
        self.nodes.is_abstract(idx)
    }

    /// Follow result links from `idx` to the node that carries its value:
    /// a value, an unknown, a block, or an identifier nothing binds.
    pub fn terminal(&self, idx: NodeIndex) -> NodeIndex {
        let mut current = idx;
        for _ in 0..limits::MAX_TERMINAL_CHASE {
            let Some(node) = self.nodes.get(current) else {
                return current;
            };
            let next = match &node.kind {
                NodeKind::Value(_) | NodeKind::Unknown(_) | NodeKind::Block(_) => NodeIndex::NONE,
                NodeKind::Assignment(a) if !node.needs_step() => a.expr,
                NodeKind::Assignment(_) => NodeIndex::NONE,
                NodeKind::Binary(b) => b.result,
                NodeKind::Unary(u) => u.result,
                NodeKind::Conditional(c) => c.result,
                NodeKind::Identifier(i) if !node.needs_step() => i.target,
                NodeKind::Identifier(_) => NodeIndex::NONE,
                NodeKind::SearchUp(block) => *block,
                NodeKind::Search(s) => match s.outcome {
                    SearchOutcome::Single(hit) if !node.needs_step() => hit,
                    _ => NodeIndex::NONE,
                },
                NodeKind::Detachment(d) if !node.needs_step() => d.body,
                NodeKind::Detachment(_) => NodeIndex::NONE,
                NodeKind::Replay(r) => match r.phase {
                    ReplayPhase::Done => r.original,
                    ReplayPhase::Replaying if !node.needs_step() => r.replica,
                    _ => NodeIndex::NONE,
                },
            };
            if next.is_none() {
                return current;
            }
            current = next;
        }
        current
    }

    /// Why `idx` has no value, if it is finished and abstract.
    pub fn unknown_reason(&self, idx: NodeIndex) -> Option<UnknownReason> {
        let node = self.nodes.get(idx)?;
        if node.needs_step() || !node.is_abstract() {
            return None;
        }
        let terminal = self.nodes.get(self.terminal(idx))?;
        match &terminal.kind {
            NodeKind::Unknown(reason) => Some(reason.clone()),
            NodeKind::Identifier(i) => Some(UnknownReason::Unbound(i.identifier.to_string())),
            _ => None,
        }
    }

    /// The integer a finished, concrete node denotes.
    pub fn value(&self, idx: NodeIndex) -> Result<i64, NodeError> {
        let node = self.nodes.node(idx)?;
        if node.needs_step() {
            return Err(NodeError::NotFinished(idx));
        }
        let terminal = self.nodes.node(self.terminal(idx))?;
        match &terminal.kind {
            NodeKind::Value(v) => Ok(*v),
            NodeKind::Unknown(reason) => Err(NodeError::NotKnowable {
                reason: reason.clone(),
            }),
            NodeKind::Identifier(i) => Err(NodeError::NotKnowable {
                reason: UnknownReason::Unbound(i.identifier.to_string()),
            }),
            other => Err(NodeError::NotAValue {
                kind: other.kind_name(),
            }),
        }
    }

    /// The scope of the finished block `idx` denotes.
    pub fn scope_id(&self, idx: NodeIndex) -> Result<MemoryId, NodeError> {
        let node = self.nodes.node(idx)?;
        if node.needs_step() {
            return Err(NodeError::NotFinished(idx));
        }
        match &self.nodes.node(self.terminal(idx))?.kind {
            NodeKind::Block(block) => Ok(block.memory),
            other => Err(NodeError::NotABlock {
                kind: other.kind_name(),
            }),
        }
    }

    pub fn scope(&self, idx: NodeIndex) -> Result<&BraneMemory, NodeError> {
        let id = self.scope_id(idx)?;
        self.memories.memory(id)
    }

    /// The hits of a finished global search (`??`, `~~`).
    pub fn matches(&self, idx: NodeIndex) -> Result<&[NodeIndex], NodeError> {
        let node = self.nodes.node(idx)?;
        if node.needs_step() {
            return Err(NodeError::NotFinished(idx));
        }
        let terminal = self.nodes.node(self.terminal(idx))?;
        match &terminal.kind {
            NodeKind::Search(search) => match &search.outcome {
                SearchOutcome::All(hits) => Ok(hits),
                _ => Err(NodeError::NotAGlobalSearch { kind: "search" }),
            },
            other => Err(NodeError::NotAGlobalSearch {
                kind: other.kind_name(),
            }),
        }
    }

    /// Scope lookup with positional shadowing, parent delegation and
    /// detachment filtering.
    pub fn lookup(
        &self,
        memory: MemoryId,
        id: &CharacterizedIdentifier,
        from_line: u32,
    ) -> Option<NodeIndex> {
        self.memories.lookup(memory, id, from_line)
    }
}
