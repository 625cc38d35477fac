//! Shorthand constructors for building syntax trees by hand.
//!
//! Front ends normally deserialize a tree; tests and embedders build one
//! directly:
//!
//! ```
//! use foolish_ast::{BinaryOp, Expr};
//!
//! let program = Expr::brane(vec![
//!     Expr::assign("a", Expr::int(1)),
//!     Expr::assign("b", Expr::binary(BinaryOp::Add, Expr::ident("a"), Expr::int(2))),
//! ]);
//! assert_eq!(program.to_string(), "{ a = 1; b = a + 2; }");
//! ```

use crate::ast::{
    Assignment, BinaryOp, Brane, ConditionalStage, DetachmentBrane, DetachmentStatement, Expr,
    ExprRef, Identifier, IfExpr, SearchExpr, SearchOperator, UnaryOp,
};
use std::sync::Arc;

impl Expr {
    pub fn int(value: i64) -> ExprRef {
        Arc::new(Self::Integer { value })
    }

    pub fn ident(name: &str) -> ExprRef {
        Arc::new(Self::Identifier(Identifier::new(name)))
    }

    pub fn characterized_ident(chain: &[&str], name: &str) -> ExprRef {
        Arc::new(Self::Identifier(Identifier::characterized(chain, name)))
    }

    pub fn unknown() -> ExprRef {
        Arc::new(Self::Unknown)
    }

    pub fn unary(op: UnaryOp, operand: ExprRef) -> ExprRef {
        Arc::new(Self::Unary { op, operand })
    }

    pub fn binary(op: BinaryOp, left: ExprRef, right: ExprRef) -> ExprRef {
        Arc::new(Self::Binary { op, left, right })
    }

    pub fn add(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Add, left, right)
    }

    pub fn mul(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Mul, left, right)
    }

    pub fn assign(name: &str, expr: ExprRef) -> ExprRef {
        Self::assign_to(Identifier::new(name), expr)
    }

    pub fn assign_to(identifier: Identifier, expr: ExprRef) -> ExprRef {
        Arc::new(Self::Assignment(Assignment { identifier, expr }))
    }

    pub fn brane(statements: Vec<ExprRef>) -> ExprRef {
        Arc::new(Self::Brane(Brane {
            statements,
            ..Brane::default()
        }))
    }

    pub fn characterized_brane(chain: &[&str], statements: Vec<ExprRef>) -> ExprRef {
        Arc::new(Self::Brane(Brane {
            characterizations: chain.iter().map(|c| (*c).to_string()).collect(),
            statements,
            ..Brane::default()
        }))
    }

    pub fn if_then(condition: ExprRef, then_branch: ExprRef, else_branch: Option<ExprRef>) -> ExprRef {
        Self::if_chain(vec![(condition, then_branch)], else_branch)
    }

    /// `if c0 then t0 elif c1 then t1 ... [else e]`
    pub fn if_chain(stages: Vec<(ExprRef, ExprRef)>, else_branch: Option<ExprRef>) -> ExprRef {
        let stages = stages
            .into_iter()
            .map(|(condition, then_branch)| ConditionalStage {
                condition,
                then_branch,
            })
            .collect();
        Arc::new(Self::If(IfExpr {
            stages,
            else_branch,
        }))
    }

    pub fn detached(stages: Vec<DetachmentBrane>, statements: Vec<ExprRef>) -> ExprRef {
        Arc::new(Self::Detached {
            stages,
            body: Brane {
                statements,
                ..Brane::default()
            },
        })
    }

    pub fn search(anchor: ExprRef, operator: SearchOperator, pattern: &str) -> ExprRef {
        Arc::new(Self::Search(SearchExpr {
            anchor,
            operator,
            pattern: pattern.to_string(),
        }))
    }

    pub fn dot(anchor: ExprRef, pattern: &str) -> ExprRef {
        Self::search(anchor, SearchOperator::Dot, pattern)
    }

    pub fn seek(anchor: ExprRef, offset: i64) -> ExprRef {
        Arc::new(Self::Seek { anchor, offset })
    }

    pub fn unanchored_seek(offset: i64) -> ExprRef {
        Arc::new(Self::UnanchoredSeek { offset })
    }

    pub fn search_up() -> ExprRef {
        Arc::new(Self::SearchUp)
    }

    pub fn stay_foolish(expr: ExprRef) -> ExprRef {
        Arc::new(Self::StayFoolish { expr })
    }
}

impl DetachmentBrane {
    pub fn new(statements: Vec<DetachmentStatement>) -> Self {
        Self { statements }
    }
}

impl DetachmentStatement {
    pub fn block(name: &str) -> Self {
        Self::Block {
            identifier: Identifier::new(name),
        }
    }

    pub fn default_value(name: &str, expr: ExprRef) -> Self {
        Self::Default {
            identifier: Identifier::new(name),
            expr,
        }
    }

    pub fn allow(name: &str) -> Self {
        Self::Allow {
            identifier: Identifier::new(name),
        }
    }

    pub fn hide_from_search(name: &str) -> Self {
        Self::HideFromSearch {
            identifier: Identifier::new(name),
        }
    }
}
