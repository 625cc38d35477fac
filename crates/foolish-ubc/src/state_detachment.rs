//! Detached branes: `[rules]...{ body }`.

use crate::detachment::{DetachmentChain, DetachmentRule, DetachmentStage, RuleKind};
use crate::error::NodeError;
use crate::node::{NodeIndex, Nyes};
use crate::query::Query;
use crate::state::Ubc;
use crate::state_step::Advance;
use foolish_ast::{DetachmentStatement, Expr, Identifier};
use std::sync::Arc;
use tracing::{trace, warn};

impl Ubc {
    pub(crate) fn step_detachment(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        if self.nodes.node(idx)?.nyes == Nyes::Uninitialized {
            return self.initialize_detachment(idx);
        }
        match self.advance(idx)? {
            Advance::Stepped => Ok(()),
            Advance::Drained => {
                let body = self.nodes.detachment(idx)?.body;
                let is_abstract = self.nodes.is_abstract(body);
                self.finish(idx, is_abstract)
            }
        }
    }

    /// Defaults are built in the detachment's own context, so they resolve
    /// against the parent scope. The body gets a scope carrying the chain.
    fn initialize_detachment(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let context = self.nodes.node(idx)?.context;
        let syntax = self.syntax(idx)?;
        let Expr::Detached { stages, body } = &*syntax else {
            return Err(NodeError::MissingSyntax(idx));
        };

        let mut chain_stages = Vec::with_capacity(stages.len());
        for stage in stages {
            let mut rules = Vec::with_capacity(stage.statements.len());
            for statement in &stage.statements {
                let kind = match statement {
                    DetachmentStatement::Block { .. } => RuleKind::Block,
                    DetachmentStatement::Allow { .. } => RuleKind::Allow,
                    DetachmentStatement::HideFromSearch { .. } => RuleKind::HideFromSearch,
                    DetachmentStatement::Default { expr, .. } => {
                        let default = self.alloc_from_syntax(expr, context, idx);
                        let pending = self.nodes.needs_step(default);
                        let detachment = self.nodes.detachment_mut(idx)?;
                        detachment.defaults.push(default);
                        if pending {
                            detachment.mind.enqueue(default);
                        }
                        RuleKind::Default(default)
                    }
                };
                let Some(query) = rule_query(statement.identifier()) else {
                    continue;
                };
                rules.push(DetachmentRule::new(query, kind, statement.to_string()));
            }
            chain_stages.push(DetachmentStage::new(rules));
        }
        let chain = DetachmentChain::new(chain_stages);
        trace!(?idx, stages = chain.len(), "detachment chain built");

        let memory = self
            .memories
            .alloc_detached(context.memory, context.line, chain);
        let body_syntax = Arc::new(Expr::Brane(body.clone()));
        let body_node = self.alloc_block(
            body_syntax,
            body.characterizations.join("'"),
            memory,
            context,
            idx,
        );
        let detachment = self.nodes.detachment_mut(idx)?;
        detachment.body = body_node;
        detachment.mind.enqueue(body_node);
        self.set_nyes(idx, Nyes::Initialized)
    }
}

/// Names with pattern characters become regexp rules. A rule whose
/// pattern does not compile is dropped.
fn rule_query(identifier: &Identifier) -> Option<Query> {
    let spelling = identifier.to_string();
    match Query::for_name(&spelling) {
        Ok(query) => Some(query),
        Err(err) => {
            warn!(rule = %spelling, error = %err, "ignoring detachment rule with invalid pattern");
            None
        }
    }
}
