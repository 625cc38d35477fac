//! Search nodes and scope-level search.
//!
//! A search first settles its anchor, then queries the anchor's block once.
//! Hits are references to bindings owned elsewhere, so the search waits
//! (without stepping them) until they finish. A miss is an `Unknown` node
//! the search owns.

use crate::error::NodeError;
use crate::identifier::CharacterizedIdentifier;
use crate::memory::MemoryId;
use crate::node::{Context, NodeIndex, NodeKind, Nyes, SearchKind, SearchOutcome, UnknownReason};
use crate::query::Query;
use crate::state::Ubc;
use crate::state_step::Advance;
use foolish_ast::{Expr, SearchOperator};
use tracing::{debug, warn};

impl Ubc {
    pub(crate) fn step_search(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let node = self.nodes.node(idx)?;
        let context = node.context;
        if node.nyes == Nyes::Uninitialized {
            if !matches!(self.nodes.search(idx)?.kind, SearchKind::RelativeSeek(_)) {
                let syntax = self.syntax(idx)?;
                let anchor = match &*syntax {
                    Expr::Search(search) => &search.anchor,
                    Expr::Seek { anchor, .. } => anchor,
                    _ => return Err(NodeError::MissingSyntax(idx)),
                };
                let anchor = self.adopt(idx, anchor, context)?;
                self.nodes.search_mut(idx)?.anchor = anchor;
            }
            return self.set_nyes(idx, Nyes::Initialized);
        }

        if self.nodes.search(idx)?.outcome == SearchOutcome::Pending {
            if self.advance(idx)? == Advance::Stepped {
                return Ok(());
            }
            let outcome = self.execute_search(idx, context)?;
            self.nodes.search_mut(idx)?.outcome = outcome;
        }

        let (pending, is_abstract) = match &self.nodes.search(idx)?.outcome {
            SearchOutcome::Single(hit) => (self.nodes.needs_step(*hit), self.nodes.is_abstract(*hit)),
            SearchOutcome::All(hits) => (
                hits.iter().any(|&h| self.nodes.needs_step(h)),
                hits.iter().any(|&h| self.nodes.is_abstract(h)),
            ),
            SearchOutcome::Pending => (true, true),
        };
        if pending {
            return self.set_nyes(idx, Nyes::Evaluating);
        }
        self.finish(idx, is_abstract)
    }

    fn execute_search(&mut self, idx: NodeIndex, context: Context) -> Result<SearchOutcome, NodeError> {
        let search = self.nodes.search(idx)?;
        let kind = search.kind.clone();
        let block = match kind {
            SearchKind::RelativeSeek(_) => self
                .memories
                .get(context.memory)
                .map_or(NodeIndex::NONE, |m| m.owner()),
            _ => {
                let terminal = self.terminal(search.anchor);
                match self.nodes.get(terminal) {
                    Some(node) if node.kind.is_block() => terminal,
                    _ => NodeIndex::NONE,
                }
            }
        };
        if block.is_none() {
            return self.miss(idx, UnknownReason::NotABrane, context);
        }
        // Searching the block we sit in only sees what precedes us.
        let limit = if self.nodes.is_ancestor(block, idx) {
            self.statement_position(block, idx)
        } else {
            None
        };

        match kind {
            SearchKind::Query { operator, pattern } => {
                let query = match operator {
                    SearchOperator::Dot => Query::regexp(&pattern),
                    _ => Ok(Query::exact(CharacterizedIdentifier::parse(&pattern))),
                };
                let query = match query {
                    Ok(query) => query,
                    Err(err) => {
                        return self.miss(idx, UnknownReason::InvalidPattern(err.to_string()), context);
                    }
                };
                let memory = self.nodes.block(block)?.memory;
                let scope = self.memories.memory(memory)?;
                let hit = match operator {
                    SearchOperator::Dot => scope.search(&query, limit),
                    SearchOperator::Backward => scope.search_backward(&query, limit),
                    SearchOperator::Forward => scope.search_forward(&query, limit),
                    SearchOperator::BackwardAll | SearchOperator::ForwardAll => {
                        let mut hits: Vec<NodeIndex> = scope
                            .search_all(&query, limit)
                            .into_iter()
                            .map(|binding| binding.node)
                            .collect();
                        if operator == SearchOperator::BackwardAll {
                            hits.reverse();
                        }
                        debug!(?idx, %pattern, hits = hits.len(), "global search");
                        return Ok(SearchOutcome::All(hits));
                    }
                };
                match hit.map(|binding| binding.node) {
                    Some(node) => {
                        debug!(?idx, %pattern, hit = ?node, "search hit");
                        Ok(SearchOutcome::Single(node))
                    }
                    None => {
                        debug!(?idx, %pattern, "search missed");
                        self.miss(idx, UnknownReason::NotFound(pattern), context)
                    }
                }
            }
            SearchKind::Seek(offset) => {
                let statements = &self.nodes.block(block)?.statements;
                let len = limit.map_or(statements.len(), |l| (l as usize).min(statements.len()));
                let position = if offset >= 0 {
                    usize::try_from(offset).ok()
                } else {
                    usize::try_from(offset.unsigned_abs())
                        .ok()
                        .and_then(|back| len.checked_sub(back))
                };
                match position.filter(|&p| p < len) {
                    Some(p) => Ok(SearchOutcome::Single(statements[p])),
                    None => self.miss(idx, UnknownReason::SeekOutOfBounds(offset), context),
                }
            }
            SearchKind::RelativeSeek(offset) => {
                if offset >= 0 {
                    return self.miss(idx, UnknownReason::InvalidSeekOffset(offset), context);
                }
                let current = limit.unwrap_or(context.line) as usize;
                let statements = &self.nodes.block(block)?.statements;
                let position = usize::try_from(offset.unsigned_abs())
                    .ok()
                    .and_then(|back| current.checked_sub(back));
                match position.and_then(|p| statements.get(p).copied()) {
                    Some(statement) => Ok(SearchOutcome::Single(statement)),
                    None => self.miss(idx, UnknownReason::SeekOutOfBounds(offset), context),
                }
            }
        }
    }

    fn miss(
        &mut self,
        idx: NodeIndex,
        reason: UnknownReason,
        context: Context,
    ) -> Result<SearchOutcome, NodeError> {
        let unknown = self.alloc_unknown(reason, context, idx);
        self.nodes.search_mut(idx)?.miss = unknown;
        Ok(SearchOutcome::Single(unknown))
    }

    /// Position, among `block`'s statements, of the statement holding `idx`.
    pub(crate) fn statement_position(&self, block: NodeIndex, idx: NodeIndex) -> Option<u32> {
        let mut current = idx;
        loop {
            let parent = self.nodes.get(current)?.parent;
            if parent == block {
                let NodeKind::Block(b) = &self.nodes.get(block)?.kind else {
                    return None;
                };
                return b
                    .statements
                    .iter()
                    .position(|&stmt| stmt == current)
                    .map(|p| p as u32);
            }
            if parent.is_none() {
                return None;
            }
            current = parent;
        }
    }

    // =========================================================================
    // Scope-level search
    // =========================================================================

    /// Dot search over a scope: the last binding whose name matches
    /// `pattern`. An invalid pattern finds nothing.
    pub fn search(&self, memory: MemoryId, pattern: &str) -> Option<NodeIndex> {
        let query = self.compile(pattern)?;
        self.memories
            .get(memory)?
            .search(&query, None)
            .map(|binding| binding.node)
    }

    /// Every binding whose name matches `pattern`, in declaration order.
    pub fn search_all(&self, memory: MemoryId, pattern: &str) -> Vec<NodeIndex> {
        let (Some(query), Some(scope)) = (self.compile(pattern), self.memories.get(memory)) else {
            return Vec::new();
        };
        scope
            .search_all(&query, None)
            .into_iter()
            .map(|binding| binding.node)
            .collect()
    }

    fn compile(&self, pattern: &str) -> Option<Query> {
        match Query::regexp(pattern) {
            Ok(query) => Some(query),
            Err(err) => {
                warn!(%pattern, error = %err, "invalid search pattern");
                None
            }
        }
    }
}
