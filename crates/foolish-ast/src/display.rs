//! Source-like printing of syntax trees, used in logs and test messages.

use crate::ast::{Brane, DetachmentStatement, Expr, Identifier};
use std::fmt;

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.characterizations {
            write!(f, "{c}'")?;
        }
        f.write_str(&self.name)
    }
}

impl fmt::Display for Brane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.characterizations {
            write!(f, "{c}'")?;
        }
        if self.statements.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{")?;
        for stmt in &self.statements {
            write!(f, " {stmt};")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for DetachmentStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block { identifier } => write!(f, "{identifier}"),
            Self::Default { identifier, expr } => write!(f, "{identifier} = {expr}"),
            Self::Allow { identifier } => write!(f, "+{identifier}"),
            Self::HideFromSearch { identifier } => write!(f, "~{identifier}"),
        }
    }
}

/// Operands that would otherwise read ambiguously get parentheses.
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::Binary { .. } | Expr::If(_) => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer { value } => write!(f, "{value}"),
            Self::Identifier(id) => write!(f, "{id}"),
            Self::Unary { op, operand } => {
                f.write_str(op.symbol())?;
                write_operand(f, operand)
            }
            Self::Binary { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right)
            }
            Self::If(if_expr) => {
                for (i, stage) in if_expr.stages.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { " elif" };
                    write!(f, "{keyword} {} then {}", stage.condition, stage.then_branch)?;
                }
                if let Some(else_branch) = &if_expr.else_branch {
                    write!(f, " else {else_branch}")?;
                }
                Ok(())
            }
            Self::Brane(brane) => write!(f, "{brane}"),
            Self::Assignment(assignment) => {
                write!(f, "{} = {}", assignment.identifier, assignment.expr)
            }
            Self::Detached { stages, body } => {
                for stage in stages {
                    f.write_str("[")?;
                    for (i, stmt) in stage.statements.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{stmt}")?;
                    }
                    f.write_str("]")?;
                }
                write!(f, "{body}")
            }
            Self::Search(search) => {
                write_operand(f, &search.anchor)?;
                write!(f, "{}{}", search.operator.symbol(), search.pattern)
            }
            Self::Seek { anchor, offset } => {
                write_operand(f, anchor)?;
                write!(f, "#{offset}")
            }
            Self::UnanchoredSeek { offset } => write!(f, "#{offset}"),
            Self::SearchUp => f.write_str("↑"),
            Self::StayFoolish { expr } => {
                f.write_str("$")?;
                write_operand(f, expr)
            }
            Self::Unknown => f.write_str("???"),
        }
    }
}
