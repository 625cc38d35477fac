//! Structural views of evaluation results.

use crate::node::{NodeIndex, NodeKind, SearchOutcome, UnknownReason};
use crate::state::Ubc;
use serde::Serialize;

/// What a node denotes, captured after (or during) evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    Value {
        value: i64,
    },
    /// Finished without a knowable value. `reason` is absent when the
    /// node is abstract only because something it depends on is.
    Unknown {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<UnknownReason>,
    },
    /// Not finished yet.
    Pending,
    Brane {
        #[serde(skip_serializing_if = "String::is_empty")]
        characterization: String,
        statements: Vec<StatementSnapshot>,
    },
    /// Hits of a global search, in result order.
    Matches {
        items: Vec<Snapshot>,
    },
    /// A reference to a brane that is already being captured.
    Enclosing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatementSnapshot {
    /// Bound name; `None` for a bare expression statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Snapshot,
}

impl Snapshot {
    pub fn capture(ubc: &Ubc, idx: NodeIndex) -> Self {
        Capture {
            ubc,
            open: Vec::new(),
        }
        .node(idx)
    }

    pub const fn is_brane(&self) -> bool {
        matches!(self, Self::Brane { .. })
    }
}

struct Capture<'a> {
    ubc: &'a Ubc,
    /// Branes on the current path, to cut `↑` cycles.
    open: Vec<NodeIndex>,
}

impl Capture<'_> {
    fn node(&mut self, idx: NodeIndex) -> Snapshot {
        let ubc = self.ubc;
        let terminal = ubc.terminal(idx);
        let Some(node) = ubc.nodes().get(terminal) else {
            return Snapshot::Unknown { reason: None };
        };
        match &node.kind {
            NodeKind::Value(value) if !node.needs_step() => Snapshot::Value { value: *value },
            NodeKind::Block(block) => {
                if self.open.contains(&terminal) {
                    return Snapshot::Enclosing;
                }
                self.open.push(terminal);
                let statements = block
                    .statements
                    .iter()
                    .map(|&stmt| StatementSnapshot {
                        name: match ubc.nodes().get(stmt).map(|n| &n.kind) {
                            Some(NodeKind::Assignment(a)) => Some(a.identifier.to_string()),
                            _ => None,
                        },
                        value: self.node(stmt),
                    })
                    .collect();
                self.open.pop();
                Snapshot::Brane {
                    characterization: block.characterization.clone(),
                    statements,
                }
            }
            NodeKind::Search(search) if !node.needs_step() => match &search.outcome {
                SearchOutcome::All(hits) => Snapshot::Matches {
                    items: hits.iter().map(|&hit| self.node(hit)).collect(),
                },
                _ => Snapshot::Unknown {
                    reason: ubc.unknown_reason(idx),
                },
            },
            _ if ubc.needs_step(idx) => Snapshot::Pending,
            _ => Snapshot::Unknown {
                reason: ubc.unknown_reason(idx),
            },
        }
    }
}
