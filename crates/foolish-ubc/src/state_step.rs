//! Stepping: dispatch, the breadth-first queue protocol, and the
//! expression variants.

use crate::error::NodeError;
use crate::node::{Context, IfState, NodeIndex, NodeKind, Nyes, UnknownReason};
use crate::state::Ubc;
use foolish_ast::{BinaryOp, Expr, ExprRef, UnaryOp};
use tracing::{debug, trace};

/// What one pass of [`Ubc::advance`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Advance {
    Stepped,
    /// The queue was already empty.
    Drained,
}

type StepFn = fn(&mut Ubc, NodeIndex) -> Result<(), NodeError>;

impl Ubc {
    /// Perform one bounded unit of work on `idx`. A no-op once the node no
    /// longer needs steps.
    pub fn step(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let node = self.nodes.node(idx)?;
        if !node.needs_step() {
            return Ok(());
        }
        let step_fn: StepFn = match &node.kind {
            NodeKind::Value(_) | NodeKind::Unknown(_) | NodeKind::SearchUp(_) => Self::step_leaf,
            NodeKind::Block(_) => Self::step_block,
            NodeKind::Assignment(_) => Self::step_assignment,
            NodeKind::Binary(_) => Self::step_binary,
            NodeKind::Unary(_) => Self::step_unary,
            NodeKind::Conditional(_) => Self::step_conditional,
            NodeKind::Identifier(_) => Self::step_identifier,
            NodeKind::Search(_) => Self::step_search,
            NodeKind::Detachment(_) => Self::step_detachment,
            NodeKind::Replay(_) => Self::step_replay,
        };
        step_fn(self, idx)
    }

    /// Pop the front of `owner`'s queue, step it once, and requeue it at the
    /// back if it still needs steps.
    pub(crate) fn advance(&mut self, owner: NodeIndex) -> Result<Advance, NodeError> {
        let Some(next) = self.nodes.mind_mut(owner)?.dequeue() else {
            return Ok(Advance::Drained);
        };
        if !self.nodes.needs_step(next) {
            return Err(NodeError::FinishedInQueue(next));
        }
        if let Err(err) = self.step(next) {
            self.nodes.mind_mut(owner)?.requeue_front(next);
            return Err(err);
        }
        if self.nodes.needs_step(next) {
            self.nodes.mind_mut(owner)?.enqueue(next);
        }
        self.set_nyes(owner, Nyes::Evaluating)?;
        Ok(Advance::Stepped)
    }

    pub(crate) fn set_nyes(&mut self, idx: NodeIndex, nyes: Nyes) -> Result<(), NodeError> {
        self.nodes.node_mut(idx)?.nyes = nyes;
        Ok(())
    }

    pub(crate) fn finish(&mut self, idx: NodeIndex, is_abstract: bool) -> Result<(), NodeError> {
        let node = self.nodes.node_mut(idx)?;
        node.nyes = Nyes::finished(is_abstract);
        trace!(?idx, kind = node.kind.kind_name(), is_abstract, "finished");
        Ok(())
    }

    pub(crate) fn syntax(&self, idx: NodeIndex) -> Result<ExprRef, NodeError> {
        self.nodes
            .node(idx)?
            .syntax
            .clone()
            .ok_or(NodeError::MissingSyntax(idx))
    }

    /// Build a child of `owner` and queue it if it has work to do.
    pub(crate) fn adopt(
        &mut self,
        owner: NodeIndex,
        expr: &ExprRef,
        context: Context,
    ) -> Result<NodeIndex, NodeError> {
        let child = self.alloc_from_syntax(expr, context, owner);
        if self.nodes.needs_step(child) {
            self.nodes.mind_mut(owner)?.enqueue(child);
        }
        Ok(child)
    }

    fn step_leaf(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let is_abstract = !matches!(
            self.nodes.node(idx)?.kind,
            NodeKind::Value(_) | NodeKind::SearchUp(_)
        );
        self.finish(idx, is_abstract)
    }

    // =========================================================================
    // Blocks and assignments
    // =========================================================================

    fn step_block(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        if self.nodes.node(idx)?.nyes == Nyes::Uninitialized {
            return self.initialize_block(idx);
        }
        match self.advance(idx)? {
            Advance::Stepped => Ok(()),
            Advance::Drained => {
                let block = self.nodes.block(idx)?;
                let is_abstract = block
                    .statements
                    .iter()
                    .any(|&stmt| self.nodes.is_abstract(stmt));
                self.finish(idx, is_abstract)
            }
        }
    }

    fn initialize_block(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let syntax = self.syntax(idx)?;
        let Expr::Brane(brane) = &*syntax else {
            return Err(NodeError::MissingSyntax(idx));
        };
        let memory = self.nodes.block(idx)?.memory;
        for (line, stmt) in brane.statements.iter().enumerate() {
            let line = line as u32;
            let child = self.alloc_from_syntax(stmt, Context::new(memory, line), idx);
            if let Expr::Assignment(assignment) = &**stmt {
                self.memories
                    .bind(memory, (&assignment.identifier).into(), line, child)?;
            }
            let pending = self.nodes.needs_step(child);
            let block = self.nodes.block_mut(idx)?;
            block.statements.push(child);
            if pending {
                block.mind.enqueue(child);
            }
        }
        trace!(?idx, ?memory, statements = brane.statements.len(), "block initialized");
        self.set_nyes(idx, Nyes::Initialized)
    }

    fn step_assignment(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let node = self.nodes.node(idx)?;
        if node.nyes == Nyes::Uninitialized {
            let context = node.context;
            let syntax = self.syntax(idx)?;
            let Expr::Assignment(assignment) = &*syntax else {
                return Err(NodeError::MissingSyntax(idx));
            };
            let expr = self.adopt(idx, &assignment.expr, context)?;
            self.nodes.assignment_mut(idx)?.expr = expr;
            return self.set_nyes(idx, Nyes::Initialized);
        }
        match self.advance(idx)? {
            Advance::Stepped => Ok(()),
            Advance::Drained => {
                let assignment = self.nodes.assignment(idx)?;
                let is_abstract = self.nodes.is_abstract(assignment.expr);
                debug!(identifier = %assignment.identifier, is_abstract, "assignment settled");
                self.finish(idx, is_abstract)
            }
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// An operand's integer, or why there is none.
    fn operand_value(&self, idx: NodeIndex) -> Result<Result<i64, UnknownReason>, NodeError> {
        if self.nodes.is_abstract(idx) {
            return Ok(Err(UnknownReason::AbstractOperand));
        }
        match self.value(idx) {
            Ok(v) => Ok(Ok(v)),
            Err(NodeError::NotAValue { .. } | NodeError::NotAGlobalSearch { .. }) => {
                Ok(Err(UnknownReason::NotAnInteger))
            }
            Err(NodeError::NotKnowable { .. }) => Ok(Err(UnknownReason::AbstractOperand)),
            Err(err) => Err(err),
        }
    }

    fn settle_operator(
        &mut self,
        idx: NodeIndex,
        outcome: Result<i64, UnknownReason>,
    ) -> Result<NodeIndex, NodeError> {
        let context = self.nodes.node(idx)?.context;
        let (result, is_abstract) = match outcome {
            Ok(v) => (self.alloc_value(v, context, idx), false),
            Err(reason) => (self.alloc_unknown(reason, context, idx), true),
        };
        self.finish(idx, is_abstract)?;
        Ok(result)
    }

    fn step_binary(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let node = self.nodes.node(idx)?;
        if node.nyes == Nyes::Uninitialized {
            let context = node.context;
            let syntax = self.syntax(idx)?;
            let Expr::Binary { left, right, .. } = &*syntax else {
                return Err(NodeError::MissingSyntax(idx));
            };
            let left = self.adopt(idx, left, context)?;
            let right = self.adopt(idx, right, context)?;
            self.nodes.binary_mut(idx)?.operands.extend([left, right]);
            return self.set_nyes(idx, Nyes::Initialized);
        }
        if self.advance(idx)? == Advance::Stepped {
            return Ok(());
        }
        let binary = self.nodes.binary(idx)?;
        let op = binary.op;
        let (left, right) = (binary.operands[0], binary.operands[1]);
        let outcome = match (self.operand_value(left)?, self.operand_value(right)?) {
            (Ok(l), Ok(r)) => Ok(evaluate_binary(op, l, r)),
            (Err(reason), _) | (_, Err(reason)) => Err(reason),
        };
        let result = self.settle_operator(idx, outcome)?;
        self.nodes.binary_mut(idx)?.result = result;
        Ok(())
    }

    fn step_unary(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let node = self.nodes.node(idx)?;
        if node.nyes == Nyes::Uninitialized {
            let context = node.context;
            let syntax = self.syntax(idx)?;
            let Expr::Unary { operand, .. } = &*syntax else {
                return Err(NodeError::MissingSyntax(idx));
            };
            let operand = self.adopt(idx, operand, context)?;
            self.nodes.unary_mut(idx)?.operand = operand;
            return self.set_nyes(idx, Nyes::Initialized);
        }
        if self.advance(idx)? == Advance::Stepped {
            return Ok(());
        }
        let unary = self.nodes.unary(idx)?;
        let op = unary.op;
        let outcome = self
            .operand_value(unary.operand)?
            .map(|v| evaluate_unary(op, v));
        let result = self.settle_operator(idx, outcome)?;
        self.nodes.unary_mut(idx)?.result = result;
        Ok(())
    }

    // =========================================================================
    // Conditionals
    // =========================================================================

    fn step_conditional(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let node = self.nodes.node(idx)?;
        let context = node.context;
        let first_step = node.nyes == Nyes::Uninitialized;
        let syntax = self.syntax(idx)?;
        let Expr::If(if_expr) = &*syntax else {
            return Err(NodeError::MissingSyntax(idx));
        };

        if first_step {
            let Some(stage) = if_expr.stages.first() else {
                return self.settle_conditional(idx, None, context);
            };
            let condition = self.alloc_from_syntax(&stage.condition, context, idx);
            let cond = self.nodes.conditional_mut(idx)?;
            cond.condition = condition;
            cond.owned.push(condition);
            return self.set_nyes(idx, Nyes::Initialized);
        }
        self.set_nyes(idx, Nyes::Evaluating)?;

        let cond = self.nodes.conditional(idx)?;
        let (state, stage) = (cond.state, cond.stage);
        let (condition, branch) = (cond.condition, cond.branch);
        match state {
            IfState::EvaluatingCondition => {
                if self.nodes.needs_step(condition) {
                    return self.step(condition);
                }
                // A condition that is not knowable counts as false.
                let decided = matches!(self.operand_value(condition)?, Ok(v) if v != 0);
                trace!(?idx, stage, decided, "condition decided");
                if decided {
                    let then_expr = &if_expr.stages[stage].then_branch;
                    let then_branch = self.alloc_from_syntax(then_expr, context, idx);
                    let cond = self.nodes.conditional_mut(idx)?;
                    cond.branch = then_branch;
                    cond.owned.push(then_branch);
                    cond.state = IfState::ConditionTrue;
                } else {
                    self.nodes.conditional_mut(idx)?.state = IfState::ConditionFalse;
                }
                Ok(())
            }
            IfState::ConditionFalse if branch.is_none() => {
                let next = stage + 1;
                if let Some(next_stage) = if_expr.stages.get(next) {
                    let condition = self.alloc_from_syntax(&next_stage.condition, context, idx);
                    let cond = self.nodes.conditional_mut(idx)?;
                    cond.stage = next;
                    cond.condition = condition;
                    cond.owned.push(condition);
                    cond.state = IfState::EvaluatingCondition;
                    return Ok(());
                }
                match &if_expr.else_branch {
                    Some(else_branch) => {
                        let else_node = self.alloc_from_syntax(else_branch, context, idx);
                        let cond = self.nodes.conditional_mut(idx)?;
                        cond.stage = next;
                        cond.branch = else_node;
                        cond.owned.push(else_node);
                        Ok(())
                    }
                    None => self.settle_conditional(idx, None, context),
                }
            }
            IfState::ConditionTrue | IfState::ConditionFalse => {
                if self.nodes.needs_step(branch) {
                    return self.step(branch);
                }
                self.settle_conditional(idx, Some(branch), context)
            }
            IfState::Done => Ok(()),
        }
    }

    /// Adopt `result`, or the implicit unknown when no branch applied.
    fn settle_conditional(
        &mut self,
        idx: NodeIndex,
        result: Option<NodeIndex>,
        context: Context,
    ) -> Result<(), NodeError> {
        let result = match result {
            Some(result) => result,
            None => {
                let unknown = self.alloc_unknown(UnknownReason::NoMatchingBranch, context, idx);
                self.nodes.conditional_mut(idx)?.owned.push(unknown);
                unknown
            }
        };
        let is_abstract = self.nodes.is_abstract(result);
        let cond = self.nodes.conditional_mut(idx)?;
        cond.result = result;
        cond.state = IfState::Done;
        if !cond.owned.contains(&result) {
            cond.owned.push(result);
        }
        self.finish(idx, is_abstract)
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    fn step_identifier(&mut self, idx: NodeIndex) -> Result<(), NodeError> {
        let context = self.nodes.node(idx)?.context;
        let ident = self.nodes.identifier(idx)?;
        let mut target = ident.target;
        if target.is_none() {
            let id = ident.identifier.clone();
            let nodes = &self.nodes;
            // A binding that encloses this identifier would wait on itself.
            let found = self.memories.resolve(context.memory, &id, context.line, |candidate| {
                !nodes.is_ancestor(candidate, idx)
            });
            let Some(found) = found else {
                debug!(identifier = %id, line = context.line, "identifier is unbound");
                return self.finish(idx, true);
            };
            debug!(identifier = %id, line = context.line, target = ?found, "identifier resolved");
            self.nodes.identifier_mut(idx)?.target = found;
            target = found;
        }
        if self.nodes.needs_step(target) {
            return self.set_nyes(idx, Nyes::Evaluating);
        }
        let is_abstract = self.nodes.is_abstract(target);
        self.finish(idx, is_abstract)
    }
}

/// Integer semantics of binary operators. Arithmetic wraps; division and
/// remainder by zero yield zero; comparisons and logic yield 1 or 0.
pub fn evaluate_binary(op: BinaryOp, l: i64, r: i64) -> i64 {
    match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div => {
            if r == 0 {
                0
            } else {
                l.wrapping_div(r)
            }
        }
        BinaryOp::Mod => {
            if r == 0 {
                0
            } else {
                l.wrapping_rem(r)
            }
        }
        BinaryOp::Eq => i64::from(l == r),
        BinaryOp::Ne => i64::from(l != r),
        BinaryOp::Lt => i64::from(l < r),
        BinaryOp::Le => i64::from(l <= r),
        BinaryOp::Gt => i64::from(l > r),
        BinaryOp::Ge => i64::from(l >= r),
        BinaryOp::And => i64::from(l != 0 && r != 0),
        BinaryOp::Or => i64::from(l != 0 || r != 0),
    }
}

pub fn evaluate_unary(op: UnaryOp, v: i64) -> i64 {
    match op {
        UnaryOp::Neg => v.wrapping_neg(),
        UnaryOp::Not => i64::from(v == 0),
        UnaryOp::Plus => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_and_remainder_by_zero_yield_zero() {
        assert_eq!(evaluate_binary(BinaryOp::Div, 10, 0), 0);
        assert_eq!(evaluate_binary(BinaryOp::Mod, 10, 0), 0);
        assert_eq!(evaluate_binary(BinaryOp::Div, 10, 3), 3);
        assert_eq!(evaluate_binary(BinaryOp::Mod, -7, 3), -1);
    }

    #[test]
    fn overflowing_arithmetic_wraps() {
        assert_eq!(evaluate_binary(BinaryOp::Add, i64::MAX, 1), i64::MIN);
        assert_eq!(evaluate_binary(BinaryOp::Div, i64::MIN, -1), i64::MIN);
        assert_eq!(evaluate_unary(UnaryOp::Neg, i64::MIN), i64::MIN);
    }

    #[test]
    fn comparisons_and_logic_yield_flags() {
        assert_eq!(evaluate_binary(BinaryOp::Lt, 1, 2), 1);
        assert_eq!(evaluate_binary(BinaryOp::Ge, 1, 2), 0);
        assert_eq!(evaluate_binary(BinaryOp::And, 3, 0), 0);
        assert_eq!(evaluate_binary(BinaryOp::Or, 0, -4), 1);
        assert_eq!(evaluate_unary(UnaryOp::Not, 0), 1);
        assert_eq!(evaluate_unary(UnaryOp::Not, 5), 0);
    }
}
