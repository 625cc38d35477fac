//! Arena storage for IR nodes.

use crate::error::NodeError;
use crate::mind::Mind;
use crate::node::{
    AssignmentNode, BinaryNode, BlockNode, ConditionalNode, DetachmentNode, IdentifierNode, Node,
    NodeIndex, NodeKind, ReplayNode, SearchNode, UnaryNode,
};
use foolish_common::limits;

/// Owns every node of one evaluation run.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

macro_rules! variant_accessors {
    ($($get:ident, $get_mut:ident => $variant:ident($ty:ty);)*) => {
        $(
            pub fn $get(&self, idx: NodeIndex) -> Result<&$ty, NodeError> {
                match &self.node(idx)?.kind {
                    NodeKind::$variant(data) => Ok(data),
                    other => Err(NodeError::NotComposite { kind: other.kind_name() }),
                }
            }

            pub fn $get_mut(&mut self, idx: NodeIndex) -> Result<&mut $ty, NodeError> {
                match &mut self.node_mut(idx)?.kind {
                    NodeKind::$variant(data) => Ok(data),
                    other => Err(NodeError::NotComposite { kind: other.kind_name() }),
                }
            }
        )*
    };
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(limits::NODE_ARENA_CAPACITY),
        }
    }

    pub fn alloc(&mut self, node: Node) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(node);
        idx
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    pub fn node(&self, idx: NodeIndex) -> Result<&Node, NodeError> {
        self.get(idx).ok_or(NodeError::UnknownNode(idx))
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Result<&mut Node, NodeError> {
        if idx.is_none() {
            return Err(NodeError::UnknownNode(idx));
        }
        self.nodes
            .get_mut(idx.0 as usize)
            .ok_or(NodeError::UnknownNode(idx))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn needs_step(&self, idx: NodeIndex) -> bool {
        self.get(idx).is_some_and(Node::needs_step)
    }

    /// Missing nodes count as abstract.
    pub fn is_abstract(&self, idx: NodeIndex) -> bool {
        self.get(idx).is_none_or(Node::is_abstract)
    }

    /// Whether `candidate` owns `idx`, directly or transitively.
    pub fn is_ancestor(&self, candidate: NodeIndex, idx: NodeIndex) -> bool {
        let mut current = self.get(idx).map_or(NodeIndex::NONE, |n| n.parent);
        while let Some(node) = self.get(current) {
            if current == candidate {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// The queue of a composite node.
    pub fn mind_mut(&mut self, idx: NodeIndex) -> Result<&mut Mind, NodeError> {
        match &mut self.node_mut(idx)?.kind {
            NodeKind::Block(b) => Ok(&mut b.mind),
            NodeKind::Assignment(a) => Ok(&mut a.mind),
            NodeKind::Binary(b) => Ok(&mut b.mind),
            NodeKind::Unary(u) => Ok(&mut u.mind),
            NodeKind::Search(s) => Ok(&mut s.mind),
            NodeKind::Detachment(d) => Ok(&mut d.mind),
            other => Err(NodeError::NotComposite {
                kind: other.kind_name(),
            }),
        }
    }

    variant_accessors! {
        block, block_mut => Block(BlockNode);
        assignment, assignment_mut => Assignment(AssignmentNode);
        binary, binary_mut => Binary(BinaryNode);
        unary, unary_mut => Unary(UnaryNode);
        conditional, conditional_mut => Conditional(ConditionalNode);
        identifier, identifier_mut => Identifier(IdentifierNode);
        search, search_mut => Search(SearchNode);
        detachment, detachment_mut => Detachment(DetachmentNode);
        replay, replay_mut => Replay(ReplayNode);
    }
}
