//! Cross-scope replay ("stay foolish").
//!
//! A replay watches an original node. If the original settles to a
//! concrete value there is nothing to do. If it settles abstract, the
//! replay deep-copies it into fresh nodes and scopes whose outer links
//! point at the replay's target context, then drives the copy. The
//! original is only read, so replaying it against several targets yields
//! independent results.

use crate::error::NodeError;
use crate::memory::MemoryId;
use crate::mind::Mind;
use crate::node::{
    AssignmentNode, BinaryNode, BlockNode, ConditionalNode, Context, DetachmentNode, IdentifierNode,
    IfState, Node, NodeIndex, NodeKind, Nyes, ReplayNode, ReplayPhase, SearchNode, SearchOutcome,
    UnaryNode,
};
use crate::state::Ubc;
use foolish_ast::{Expr, ExprRef};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

/// Header fields of a copy under construction.
struct Slot {
    nyes: Nyes,
    context: Context,
    parent: NodeIndex,
    syntax: Option<ExprRef>,
}

/// Old-to-new ids for one replay copy.
struct CloneMap {
    nodes: FxHashMap<NodeIndex, NodeIndex>,
    memories: FxHashMap<MemoryId, MemoryId>,
    target: Context,
}

impl CloneMap {
    fn new(target: Context) -> Self {
        Self {
            nodes: FxHashMap::default(),
            memories: FxHashMap::default(),
            target,
        }
    }

    /// Contexts inside the copied subgraph follow the copy; anything
    /// outside it is replaced by the target.
    fn context(&self, context: Context) -> Context {
        match self.memories.get(&context.memory) {
            Some(&memory) => Context::new(memory, context.line),
            None => self.target,
        }
    }

    /// References into the copied subgraph follow the copy; references
    /// out of it are kept.
    fn node(&self, idx: NodeIndex) -> NodeIndex {
        self.nodes.get(&idx).copied().unwrap_or(idx)
    }
}

impl Ubc {
    /// A replay of `original` against `line` of `memory`.
    ///
    /// The replay does not own `original`: it waits for whoever does to
    /// finish it. Drive the returned node with [`Ubc::run`].
    pub fn replay(&mut self, original: NodeIndex, memory: MemoryId, line: u32) -> NodeIndex {
        let target = Context::new(memory, line);
        self.nodes.alloc(Node {
            kind: NodeKind::Replay(ReplayNode {
                original,
                owns_original: false,
                target,
                phase: ReplayPhase::Observing,
                replica: NodeIndex::NONE,
            }),
            nyes: Nyes::Initialized,
            context: target,
            parent: NodeIndex::NONE,
            syntax: None,
        })
    }

    pub(crate) fn step_replay(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let node = self.nodes.node(idx)?;
        let context = node.context;
        if node.nyes == Nyes::Uninitialized {
            let syntax = self.syntax(idx)?;
            let Expr::StayFoolish { expr } = &*syntax else {
                return Err(NodeError::MissingSyntax(idx));
            };
            let original = self.alloc_from_syntax(expr, context, idx);
            self.nodes.replay_mut(idx)?.original = original;
            return self.set_nyes(idx, Nyes::Initialized);
        }
        self.set_nyes(idx, Nyes::Evaluating)?;

        let replay = self.nodes.replay(idx)?;
        let (original, owns_original) = (replay.original, replay.owns_original);
        let (target, replica, phase) = (replay.target, replay.replica, replay.phase);
        match phase {
            ReplayPhase::Observing => {
                if self.nodes.needs_step(original) {
                    if owns_original {
                        return self.step(original);
                    }
                    return Ok(());
                }
                if !self.nodes.is_abstract(original) {
                    self.nodes.replay_mut(idx)?.phase = ReplayPhase::Done;
                    return self.finish(idx, false);
                }
                let subject = self.replay_subject(original);
                let replica = self.clone_for_replay(subject, target, idx)?;
                debug!(?idx, ?original, ?subject, ?replica, "replaying abstract node");
                let replay = self.nodes.replay_mut(idx)?;
                replay.replica = replica;
                replay.phase = ReplayPhase::Replaying;
                Ok(())
            }
            ReplayPhase::Replaying => {
                if self.nodes.needs_step(replica) {
                    return self.step(replica);
                }
                let is_abstract = self.nodes.is_abstract(replica);
                debug!(?idx, is_abstract, "replay settled");
                self.finish(idx, is_abstract)
            }
            ReplayPhase::Done => Ok(()),
        }
    }

    /// What to re-evaluate for an abstract original. A reference that
    /// found something replays what it found; one that found nothing is
    /// replayed itself so it searches again.
    fn replay_subject(&self, original: NodeIndex) -> NodeIndex {
        let Some(node) = self.nodes.get(original) else {
            return original;
        };
        let resolved = match &node.kind {
            NodeKind::Identifier(i) => i.target.is_some(),
            NodeKind::Search(s) => s.miss.is_none() && matches!(s.outcome, SearchOutcome::Single(_)),
            _ => false,
        };
        if resolved {
            self.terminal(original)
        } else {
            original
        }
    }

    /// Deep-copy the subgraph rooted at `subject` for evaluation at `target`.
    pub(crate) fn clone_for_replay(
        &mut self,
        subject: NodeIndex,
        target: Context,
        parent: NodeIndex,
    ) -> Result<NodeIndex, NodeError> {
        let mut map = CloneMap::new(target);
        self.clone_node(subject, parent, &mut map)
    }

    /// Finished concrete nodes are copied as they are. Abstract ones are
    /// reset so the copy evaluates them again: operands and statements are
    /// copied and requeued, identifiers resolve again, and the remaining
    /// variants are rebuilt from their syntax.
    fn clone_node(
        &mut self,
        idx: NodeIndex,
        parent: NodeIndex,
        map: &mut CloneMap,
    ) -> Result<NodeIndex, NodeError> {
        let Node {
            kind,
            nyes,
            context: source_context,
            syntax,
            ..
        } = self.nodes.node(idx)?.clone();
        let context = map.context(source_context);
        let keep = nyes == Nyes::Constant;

        let (kind, nyes) = match kind {
            kind @ (NodeKind::Value(_) | NodeKind::Unknown(_)) => (kind, nyes),
            NodeKind::SearchUp(block) => (NodeKind::SearchUp(map.node(block)), nyes),
            NodeKind::Block(block) => {
                return self.clone_block(idx, syntax, block, source_context, parent, keep, map);
            }
            NodeKind::Identifier(ident) if keep => {
                let target = map.node(ident.target);
                (
                    NodeKind::Identifier(IdentifierNode { target, ..ident }),
                    Nyes::Constant,
                )
            }
            NodeKind::Identifier(ident) => (
                NodeKind::Identifier(IdentifierNode {
                    identifier: ident.identifier,
                    target: NodeIndex::NONE,
                }),
                Nyes::Uninitialized,
            ),
            kind @ (NodeKind::Assignment(_) | NodeKind::Binary(_) | NodeKind::Unary(_)) => {
                let slot = Slot { nyes, context, parent, syntax };
                return self.clone_operator(idx, kind, slot, keep, map);
            }
            NodeKind::Conditional(cond) if keep => {
                let owned = self.reserve(idx, Slot { nyes, context, parent, syntax }, map);
                let result = self.clone_node(cond.result, owned, map)?;
                let copy = NodeKind::Conditional(ConditionalNode {
                    state: IfState::Done,
                    stage: cond.stage,
                    condition: NodeIndex::NONE,
                    branch: NodeIndex::NONE,
                    owned: SmallVec::from_slice(&[result]),
                    result,
                });
                self.nodes.node_mut(owned)?.kind = copy;
                return Ok(owned);
            }
            NodeKind::Search(search) if keep => {
                let owned = self.reserve(idx, Slot { nyes, context, parent, syntax }, map);
                let anchor = if search.anchor.is_some() {
                    self.clone_node(search.anchor, owned, map)?
                } else {
                    NodeIndex::NONE
                };
                let outcome = match search.outcome {
                    SearchOutcome::Single(hit) => SearchOutcome::Single(map.node(hit)),
                    SearchOutcome::All(hits) => {
                        SearchOutcome::All(hits.into_iter().map(|h| map.node(h)).collect())
                    }
                    SearchOutcome::Pending => SearchOutcome::Pending,
                };
                let copy = NodeKind::Search(SearchNode {
                    kind: search.kind,
                    anchor,
                    mind: Mind::new(),
                    outcome,
                    miss: NodeIndex::NONE,
                });
                self.nodes.node_mut(owned)?.kind = copy;
                return Ok(owned);
            }
            NodeKind::Detachment(detachment) if keep => {
                let owned = self.reserve(idx, Slot { nyes, context, parent, syntax }, map);
                let mut defaults = SmallVec::new();
                for default in detachment.defaults {
                    defaults.push(self.clone_node(default, owned, map)?);
                }
                let body = self.clone_node(detachment.body, owned, map)?;
                let copy = NodeKind::Detachment(DetachmentNode {
                    defaults,
                    body,
                    mind: Mind::new(),
                });
                self.nodes.node_mut(owned)?.kind = copy;
                return Ok(owned);
            }
            NodeKind::Replay(replay) if keep => {
                let owned = self.reserve(idx, Slot { nyes, context, parent, syntax }, map);
                let original = if replay.owns_original {
                    self.clone_node(replay.original, owned, map)?
                } else {
                    replay.original
                };
                let replica = if replay.replica.is_some() {
                    self.clone_node(replay.replica, owned, map)?
                } else {
                    NodeIndex::NONE
                };
                let copy = NodeKind::Replay(ReplayNode {
                    original,
                    replica,
                    target: map.context(replay.target),
                    ..replay
                });
                self.nodes.node_mut(owned)?.kind = copy;
                return Ok(owned);
            }
            NodeKind::Conditional(_)
            | NodeKind::Search(_)
            | NodeKind::Detachment(_)
            | NodeKind::Replay(_) => {
                let Some(syntax) = &syntax else {
                    return Err(NodeError::MissingSyntax(idx));
                };
                let copy = self.alloc_from_syntax(syntax, context, parent);
                map.nodes.insert(idx, copy);
                return Ok(copy);
            }
        };
        let copy = self.nodes.alloc(Node {
            kind,
            nyes,
            context,
            parent,
            syntax,
        });
        map.nodes.insert(idx, copy);
        Ok(copy)
    }

    /// Allocate the copy's slot before its children, so children can name
    /// it as their parent. Its kind is filled in by the caller.
    fn reserve(&mut self, idx: NodeIndex, slot: Slot, map: &mut CloneMap) -> NodeIndex {
        let copy = self.nodes.alloc(Node {
            kind: NodeKind::Value(0),
            nyes: slot.nyes,
            context: slot.context,
            parent: slot.parent,
            syntax: slot.syntax,
        });
        map.nodes.insert(idx, copy);
        copy
    }

    fn clone_operator(
        &mut self,
        idx: NodeIndex,
        kind: NodeKind,
        slot: Slot,
        keep: bool,
        map: &mut CloneMap,
    ) -> Result<NodeIndex, NodeError> {
        let owned = self.reserve(idx, slot, map);
        let mut mind = Mind::new();
        let mut copy_child = |ubc: &mut Self, child: NodeIndex| -> Result<NodeIndex, NodeError> {
            if child.is_none() {
                return Ok(child);
            }
            let copy = ubc.clone_node(child, owned, map)?;
            if ubc.nodes.needs_step(copy) {
                mind.enqueue(copy);
            }
            Ok(copy)
        };
        let kind = match kind {
            NodeKind::Assignment(assignment) => {
                let expr = copy_child(self, assignment.expr)?;
                NodeKind::Assignment(AssignmentNode {
                    identifier: assignment.identifier,
                    expr,
                    mind,
                })
            }
            NodeKind::Binary(binary) => {
                let mut operands = SmallVec::new();
                for operand in binary.operands {
                    operands.push(copy_child(self, operand)?);
                }
                let result = if keep {
                    self.clone_node(binary.result, owned, map)?
                } else {
                    NodeIndex::NONE
                };
                NodeKind::Binary(BinaryNode {
                    op: binary.op,
                    operands,
                    mind,
                    result,
                })
            }
            NodeKind::Unary(unary) => {
                let operand = copy_child(self, unary.operand)?;
                let result = if keep {
                    self.clone_node(unary.result, owned, map)?
                } else {
                    NodeIndex::NONE
                };
                NodeKind::Unary(UnaryNode {
                    op: unary.op,
                    operand,
                    mind,
                    result,
                })
            }
            other => other,
        };
        let copy = self.nodes.node_mut(owned)?;
        copy.kind = kind;
        copy.nyes = if keep { Nyes::Constant } else { Nyes::Initialized };
        Ok(owned)
    }

    /// A block copy gets a fresh scope. Outside the copied subgraph its
    /// parent becomes the target context.
    fn clone_block(
        &mut self,
        idx: NodeIndex,
        syntax: Option<ExprRef>,
        block: BlockNode,
        context: Context,
        parent: NodeIndex,
        keep: bool,
        map: &mut CloneMap,
    ) -> Result<NodeIndex, NodeError> {
        let source = self.memories.memory(block.memory)?;
        let outer = map.context(Context::new(source.parent(), source.creation_line()));
        let chain = source.detachment().remap_defaults(|n| map.node(n));
        let bindings: Vec<_> = source
            .bindings()
            .iter()
            .map(|b| (b.identifier.clone(), b.line, b.node))
            .collect();

        let memory = self.memories.alloc_detached(outer.memory, outer.line, chain);
        map.memories.insert(block.memory, memory);
        let copy = self.nodes.alloc(Node {
            kind: NodeKind::Block(BlockNode {
                characterization: block.characterization,
                memory,
                statements: Vec::with_capacity(block.statements.len()),
                mind: Mind::new(),
            }),
            nyes: if keep { Nyes::Constant } else { Nyes::Initialized },
            context: map.context(context),
            parent,
            syntax,
        });
        self.memories.set_owner(memory, copy)?;
        map.nodes.insert(idx, copy);

        for stmt in block.statements {
            let stmt_copy = self.clone_node(stmt, copy, map)?;
            let pending = self.nodes.needs_step(stmt_copy);
            let copied = self.nodes.block_mut(copy)?;
            copied.statements.push(stmt_copy);
            if pending {
                copied.mind.enqueue(stmt_copy);
            }
        }
        for (identifier, line, node) in bindings {
            let node = map.node(node);
            self.memories.bind(memory, identifier, line, node)?;
        }
        Ok(copy)
    }
}
