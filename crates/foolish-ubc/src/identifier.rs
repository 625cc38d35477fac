//! Identifiers keyed by their canonical characterized spelling.

use foolish_ast::Identifier;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A (name, characterization) pair.
///
/// The canonical form is the characterization chain and the name joined
/// with `'` (`type'x`, `a'b'x`, plain `x`). Equality and hashing use only
/// the canonical form, so `type'x` and `x` live in disjoint namespaces.
#[derive(Clone, Debug)]
pub struct CharacterizedIdentifier {
    canonical: String,
    // Byte offset of the bare name inside `canonical`.
    name_start: usize,
}

impl CharacterizedIdentifier {
    pub fn new(name: &str) -> Self {
        Self {
            canonical: name.to_string(),
            name_start: 0,
        }
    }

    /// `characterization` is an already-flattened chain such as `a'b`.
    pub fn characterized(characterization: &str, name: &str) -> Self {
        if characterization.is_empty() {
            return Self::new(name);
        }
        Self {
            canonical: format!("{characterization}'{name}"),
            name_start: characterization.len() + 1,
        }
    }

    /// Split a canonical spelling back into its parts; the name is the
    /// segment after the last `'`.
    pub fn parse(canonical: &str) -> Self {
        match canonical.rsplit_once('\'') {
            Some((characterization, name)) => Self::characterized(characterization, name),
            None => Self::new(canonical),
        }
    }

    pub fn name(&self) -> &str {
        &self.canonical[self.name_start..]
    }

    pub fn characterization(&self) -> &str {
        if self.name_start == 0 {
            ""
        } else {
            &self.canonical[..self.name_start - 1]
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub const fn is_characterized(&self) -> bool {
        self.name_start != 0
    }
}

impl From<&Identifier> for CharacterizedIdentifier {
    fn from(id: &Identifier) -> Self {
        Self::characterized(&id.characterization(), &id.name)
    }
}

impl PartialEq for CharacterizedIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for CharacterizedIdentifier {}

impl Hash for CharacterizedIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for CharacterizedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn characterization_separates_namespaces() {
        let plain = CharacterizedIdentifier::new("x");
        let typed = CharacterizedIdentifier::characterized("type", "x");
        assert_ne!(plain, typed);
        assert_eq!(typed.canonical(), "type'x");
        assert_eq!(typed.name(), "x");
        assert_eq!(typed.characterization(), "type");
        assert_eq!(plain.characterization(), "");
    }

    #[test]
    fn parse_splits_on_last_quote() {
        let id = CharacterizedIdentifier::parse("a'b'x");
        assert_eq!(id.characterization(), "a'b");
        assert_eq!(id.name(), "x");
        assert_eq!(id, CharacterizedIdentifier::characterized("a'b", "x"));
    }

    #[test]
    fn syntax_identifier_converts_to_canonical_form() {
        let syntax = Identifier::characterized(&["outer", "inner"], "v");
        let id = CharacterizedIdentifier::from(&syntax);
        assert_eq!(id.to_string(), "outer'inner'v");
    }
}
