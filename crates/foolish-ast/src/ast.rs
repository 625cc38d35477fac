//! Syntax node definitions.

use foolish_common::SourceLocation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to an immutable syntax node.
pub type ExprRef = Arc<Expr>;

// =============================================================================
// Identifiers
// =============================================================================

/// An identifier with an optional characterization chain.
///
/// `type'x` has characterizations `["type"]` and name `x`; `a'b'x` has
/// `["a", "b"]`. A plain `x` has an empty chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characterizations: Vec<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "is_unknown_location")]
    pub location: SourceLocation,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            characterizations: Vec::new(),
            name: name.into(),
            location: SourceLocation::UNKNOWN,
        }
    }

    pub fn characterized<S: AsRef<str>>(chain: &[S], name: impl Into<String>) -> Self {
        Self {
            characterizations: chain.iter().map(|c| c.as_ref().to_string()).collect(),
            name: name.into(),
            location: SourceLocation::UNKNOWN,
        }
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    /// The characterization chain joined with `'`, without a trailing quote.
    /// Empty for a plain identifier.
    pub fn characterization(&self) -> String {
        self.characterizations.join("'")
    }
}

fn is_unknown_location(loc: &SourceLocation) -> bool {
    !loc.is_known()
}

// =============================================================================
// Operators
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Parse an operator token. `<>` is accepted as a spelling of `!=`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "==" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
    Plus,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
            Self::Plus => "+",
        }
    }
}

/// Search operators applied to an anchor brane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOperator {
    /// `b.pattern`: regular-expression search, last match wins.
    Dot,
    /// `b?name`: exact search from the end of the brane.
    Backward,
    /// `b~name`: exact search from the start of the brane.
    Forward,
    /// `b??name`: every exact match, latest first.
    BackwardAll,
    /// `b~~name`: every exact match, in declaration order.
    ForwardAll,
}

impl SearchOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Dot => ".",
            Self::Backward => "?",
            Self::Forward => "~",
            Self::BackwardAll => "??",
            Self::ForwardAll => "~~",
        }
    }

    pub const fn is_global(self) -> bool {
        matches!(self, Self::BackwardAll | Self::ForwardAll)
    }
}

// =============================================================================
// Compound nodes
// =============================================================================

/// An ordered statement list, optionally characterized (`type'{ ... }`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Brane {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characterizations: Vec<String>,
    pub statements: Vec<ExprRef>,
    #[serde(default, skip_serializing_if = "is_unknown_location")]
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub identifier: Identifier,
    pub expr: ExprRef,
}

/// One `if`/`elif` stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalStage {
    pub condition: ExprRef,
    pub then_branch: ExprRef,
}

/// `if c then t elif c2 then t2 ... else e`.
///
/// `stages[0]` is the `if`; the rest are `elif`s in declared order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfExpr {
    pub stages: Vec<ConditionalStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_branch: Option<ExprRef>,
}

/// A declaration inside a detachment annotation `[ ... ]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DetachmentStatement {
    /// `[a]`: hide the parent's `a`.
    Block { identifier: Identifier },
    /// `[a = expr]`: hide the parent's `a` and supply a default.
    Default {
        identifier: Identifier,
        expr: ExprRef,
    },
    /// `[+a]`: make the parent's `a` visible again.
    Allow { identifier: Identifier },
    /// `[~a]`: hide `a` from searches anchored on the detached brane.
    HideFromSearch { identifier: Identifier },
}

impl DetachmentStatement {
    pub const fn identifier(&self) -> &Identifier {
        match self {
            Self::Block { identifier }
            | Self::Default { identifier, .. }
            | Self::Allow { identifier }
            | Self::HideFromSearch { identifier } => identifier,
        }
    }
}

/// One detachment annotation. A chain `[d1][d2]{...}` has two.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetachmentBrane {
    pub statements: Vec<DetachmentStatement>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchExpr {
    pub anchor: ExprRef,
    pub operator: SearchOperator,
    pub pattern: String,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Integer {
        value: i64,
    },
    Identifier(Identifier),
    Unary {
        op: UnaryOp,
        operand: ExprRef,
    },
    Binary {
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    },
    If(IfExpr),
    Brane(Brane),
    Assignment(Assignment),
    /// `[d1][d2]...{ body }`
    Detached {
        stages: Vec<DetachmentBrane>,
        body: Brane,
    },
    Search(SearchExpr),
    /// `b#n`: the n-th statement of `b`; negative counts from the end.
    Seek {
        anchor: ExprRef,
        offset: i64,
    },
    /// `#-n`: the statement n positions before the current one.
    UnanchoredSeek {
        offset: i64,
    },
    /// `↑`: the enclosing brane.
    SearchUp,
    /// `$expr`: re-evaluate an abstract result where the marker stands.
    StayFoolish {
        expr: ExprRef,
    },
    /// `???`
    Unknown,
}

impl Expr {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Integer { .. } => "integer",
            Self::Identifier(_) => "identifier",
            Self::Unary { .. } => "unary",
            Self::Binary { .. } => "binary",
            Self::If(_) => "if",
            Self::Brane(_) => "brane",
            Self::Assignment(_) => "assignment",
            Self::Detached { .. } => "detached",
            Self::Search(_) => "search",
            Self::Seek { .. } => "seek",
            Self::UnanchoredSeek { .. } => "unanchored_seek",
            Self::SearchUp => "search_up",
            Self::StayFoolish { .. } => "stay_foolish",
            Self::Unknown => "unknown",
        }
    }
}
