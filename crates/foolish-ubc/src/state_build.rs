//! Node construction from syntax.
//!
//! Construction never evaluates: composite nodes start `Uninitialized` and
//! build their children on their first step. The one exception is a
//! block's scope, which is opened immediately so that its creation line is
//! fixed by where the block appears.

use crate::memory::MemoryId;
use crate::mind::Mind;
use crate::node::{
    AssignmentNode, BinaryNode, BlockNode, ConditionalNode, Context, DetachmentNode,
    IdentifierNode, Node, NodeIndex, NodeKind, Nyes, ReplayNode, ReplayPhase, SearchKind,
    SearchNode, SearchOutcome, UnaryNode, UnknownReason,
};
use crate::state::Ubc;
use foolish_ast::{Expr, ExprRef};
use smallvec::SmallVec;

impl Ubc {
    pub(crate) fn alloc_from_syntax(
        &mut self,
        expr: &ExprRef,
        context: Context,
        parent: NodeIndex,
    ) -> NodeIndex {
        let (kind, nyes) = match &**expr {
            Expr::Integer { value } => (NodeKind::Value(*value), Nyes::Constant),
            Expr::Unknown => (NodeKind::Unknown(UnknownReason::Literal), Nyes::Constanic),
            Expr::Identifier(id) => (
                NodeKind::Identifier(IdentifierNode {
                    identifier: id.into(),
                    target: NodeIndex::NONE,
                }),
                Nyes::Uninitialized,
            ),
            Expr::Unary { op, .. } => (
                NodeKind::Unary(UnaryNode {
                    op: *op,
                    operand: NodeIndex::NONE,
                    mind: Mind::new(),
                    result: NodeIndex::NONE,
                }),
                Nyes::Uninitialized,
            ),
            Expr::Binary { op, .. } => (
                NodeKind::Binary(BinaryNode {
                    op: *op,
                    operands: SmallVec::new(),
                    mind: Mind::new(),
                    result: NodeIndex::NONE,
                }),
                Nyes::Uninitialized,
            ),
            Expr::If(_) => (
                NodeKind::Conditional(ConditionalNode::default()),
                Nyes::Uninitialized,
            ),
            Expr::Brane(brane) => {
                let memory = self.memories.alloc(context.memory, context.line);
                return self.alloc_block(
                    expr.clone(),
                    brane.characterizations.join("'"),
                    memory,
                    context,
                    parent,
                );
            }
            Expr::Assignment(assignment) => (
                NodeKind::Assignment(AssignmentNode {
                    identifier: (&assignment.identifier).into(),
                    expr: NodeIndex::NONE,
                    mind: Mind::new(),
                }),
                Nyes::Uninitialized,
            ),
            Expr::Detached { .. } => (
                NodeKind::Detachment(DetachmentNode {
                    defaults: SmallVec::new(),
                    body: NodeIndex::NONE,
                    mind: Mind::new(),
                }),
                Nyes::Uninitialized,
            ),
            Expr::Search(search) => (
                Self::search_kind(SearchKind::Query {
                    operator: search.operator,
                    pattern: search.pattern.clone(),
                }),
                Nyes::Uninitialized,
            ),
            Expr::Seek { offset, .. } => {
                (Self::search_kind(SearchKind::Seek(*offset)), Nyes::Uninitialized)
            }
            Expr::UnanchoredSeek { offset } => (
                Self::search_kind(SearchKind::RelativeSeek(*offset)),
                Nyes::Uninitialized,
            ),
            Expr::SearchUp => {
                let block = self
                    .memories
                    .get(context.memory)
                    .map_or(NodeIndex::NONE, |m| m.owner());
                if block.is_some() {
                    (NodeKind::SearchUp(block), Nyes::Constant)
                } else {
                    (NodeKind::Unknown(UnknownReason::NotABrane), Nyes::Constanic)
                }
            }
            Expr::StayFoolish { .. } => (
                NodeKind::Replay(ReplayNode {
                    original: NodeIndex::NONE,
                    owns_original: true,
                    target: context,
                    phase: ReplayPhase::Observing,
                    replica: NodeIndex::NONE,
                }),
                Nyes::Uninitialized,
            ),
        };
        self.nodes.alloc(Node {
            kind,
            nyes,
            context,
            parent,
            syntax: Some(expr.clone()),
        })
    }

    /// A block over an already opened scope. `syntax` must be a brane.
    pub(crate) fn alloc_block(
        &mut self,
        syntax: ExprRef,
        characterization: String,
        memory: MemoryId,
        context: Context,
        parent: NodeIndex,
    ) -> NodeIndex {
        let idx = self.nodes.alloc(Node {
            kind: NodeKind::Block(BlockNode {
                characterization,
                memory,
                statements: Vec::new(),
                mind: Mind::new(),
            }),
            nyes: Nyes::Uninitialized,
            context,
            parent,
            syntax: Some(syntax),
        });
        let owned = self.memories.set_owner(memory, idx);
        debug_assert!(owned.is_ok(), "scope {memory:?} is allocated before its block");
        idx
    }

    fn search_kind(kind: SearchKind) -> NodeKind {
        NodeKind::Search(SearchNode {
            kind,
            anchor: NodeIndex::NONE,
            mind: Mind::new(),
            outcome: SearchOutcome::Pending,
            miss: NodeIndex::NONE,
        })
    }

    /// A node carrying a data-level non-answer.
    pub(crate) fn alloc_unknown(
        &mut self,
        reason: UnknownReason,
        context: Context,
        parent: NodeIndex,
    ) -> NodeIndex {
        self.nodes.alloc(Node {
            kind: NodeKind::Unknown(reason),
            nyes: Nyes::Constanic,
            context,
            parent,
            syntax: None,
        })
    }

    pub(crate) fn alloc_value(&mut self, value: i64, context: Context, parent: NodeIndex) -> NodeIndex {
        self.nodes.alloc(Node {
            kind: NodeKind::Value(value),
            nyes: Nyes::Constant,
            context,
            parent,
            syntax: None,
        })
    }
}
