//! Binding queries: exact identifiers and regular expressions.

use crate::identifier::CharacterizedIdentifier;
use regex::Regex;

/// A compiled regular-expression query over identifier names.
///
/// A pattern that neither starts with `^` nor ends with `$` is matched as a
/// whole name (`b.*` becomes `^b.*$`). A pattern carrying an explicit
/// anchor is used as written, so `^a` matches `abc`.
#[derive(Clone, Debug)]
pub struct RegexpQuery {
    pattern: String,
    regex: Regex,
}

impl RegexpQuery {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&Self::effective_pattern(pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn effective_pattern(pattern: &str) -> String {
        if pattern.starts_with('^') || pattern.ends_with('$') {
            pattern.to_string()
        } else {
            format!("^{pattern}$")
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Tested against the canonical spelling and against the bare name.
    pub fn is_match(&self, id: &CharacterizedIdentifier) -> bool {
        self.regex.is_match(id.canonical()) || self.regex.is_match(id.name())
    }
}

impl PartialEq for RegexpQuery {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    Exact(CharacterizedIdentifier),
    Regexp(RegexpQuery),
}

impl Query {
    pub fn exact(id: CharacterizedIdentifier) -> Self {
        Self::Exact(id)
    }

    pub fn regexp(pattern: &str) -> Result<Self, regex::Error> {
        RegexpQuery::new(pattern).map(Self::Regexp)
    }

    /// An exact query for plain names, a regexp query for anything that
    /// looks like a pattern.
    pub fn for_name(name: &str) -> Result<Self, regex::Error> {
        if looks_like_pattern(name) {
            Self::regexp(name)
        } else {
            Ok(Self::Exact(CharacterizedIdentifier::parse(name)))
        }
    }

    pub fn matches(&self, id: &CharacterizedIdentifier) -> bool {
        match self {
            Self::Exact(expected) => expected == id,
            Self::Regexp(query) => query.is_match(id),
        }
    }
}

pub fn looks_like_pattern(name: &str) -> bool {
    name.chars().any(|c| {
        matches!(
            c,
            '*' | '.' | '^' | '$' | '[' | ']' | '(' | ')' | '|' | '?' | '+' | '{' | '}' | '\\'
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CharacterizedIdentifier {
        CharacterizedIdentifier::parse(name)
    }

    #[test]
    fn unanchored_pattern_matches_whole_names_only() {
        let query = RegexpQuery::new("b.*").unwrap();
        assert!(query.is_match(&id("bcd")));
        assert!(!query.is_match(&id("abc")));
        assert_eq!(RegexpQuery::effective_pattern("b.*"), "^b.*$");
    }

    #[test]
    fn explicit_anchor_allows_prefix_match() {
        let query = RegexpQuery::new("^a").unwrap();
        assert!(query.is_match(&id("abc")));
        assert!(!query.is_match(&id("bac")));
        let tail = RegexpQuery::new("c$").unwrap();
        assert!(tail.is_match(&id("abc")));
    }

    #[test]
    fn pattern_matches_bare_name_of_characterized_identifier() {
        let query = RegexpQuery::new("x.*").unwrap();
        assert!(query.is_match(&id("type'xy")));
        let characterized = RegexpQuery::new("type'x.*").unwrap();
        assert!(characterized.is_match(&id("type'xy")));
        assert!(!characterized.is_match(&id("xy")));
    }

    #[test]
    fn exact_query_requires_matching_characterization() {
        let query = Query::for_name("type'x").unwrap();
        assert!(query.matches(&id("type'x")));
        assert!(!query.matches(&id("x")));
        assert!(matches!(Query::for_name("x.*").unwrap(), Query::Regexp(_)));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(RegexpQuery::new("a(").is_err());
    }
}
