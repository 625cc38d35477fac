//! Source positions attached to syntax nodes by the parser.

use serde::{Deserialize, Serialize};

/// A 1-based line/column position in the original source text.
///
/// The core never inspects positions; they ride along so front ends can
/// point diagnostics at the right place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub const UNKNOWN: Self = Self { line: 0, column: 0 };

    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        self.line != 0
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            f.write_str("<unknown>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_displays_placeholder() {
        assert_eq!(SourceLocation::UNKNOWN.to_string(), "<unknown>");
        assert_eq!(SourceLocation::new(3, 7).to_string(), "3:7");
    }

    #[test]
    fn location_round_trips_through_json() {
        let loc = SourceLocation::new(12, 1);
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, r#"{"line":12,"column":1}"#);
    }
}
