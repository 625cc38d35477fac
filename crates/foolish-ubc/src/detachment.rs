//! Detachment filters: chained visibility rules between a detached brane
//! and its parent scope.
//!
//! `[d1][d2][d3]{ ... }` attaches three stages to the body's scope. A
//! lookup that falls through to the parent asks the chain first. Stages are
//! consulted right to left and each one that has a rule for the identifier
//! overrides the decision so far, so the leftmost stage with an opinion
//! wins. A blocked identifier takes the first default found scanning left
//! to right, or is not found.

use crate::identifier::CharacterizedIdentifier;
use crate::node::NodeIndex;
use crate::query::Query;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Blocked,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RuleKind {
    Block,
    /// Block and supply this node's value instead.
    Default(NodeIndex),
    Allow,
    /// Hide from anchored searches into the body; lookups are unaffected.
    HideFromSearch,
}

#[derive(Clone, Debug)]
pub struct DetachmentRule {
    pub query: Query,
    pub kind: RuleKind,
    /// Source spelling, used to recognize repeated stages.
    pub text: String,
}

impl DetachmentRule {
    pub fn new(query: Query, kind: RuleKind, text: impl Into<String>) -> Self {
        Self {
            query,
            kind,
            text: text.into(),
        }
    }

    fn visibility(&self) -> Option<Visibility> {
        match self.kind {
            RuleKind::Block | RuleKind::Default(_) => Some(Visibility::Blocked),
            RuleKind::Allow => Some(Visibility::Visible),
            RuleKind::HideFromSearch => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DetachmentStage {
    rules: Vec<DetachmentRule>,
}

impl DetachmentStage {
    pub fn new(rules: Vec<DetachmentRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[DetachmentRule] {
        &self.rules
    }

    /// The first visibility rule in this stage that names `id`.
    pub fn decision(&self, id: &CharacterizedIdentifier) -> Option<Visibility> {
        self.rules
            .iter()
            .filter(|rule| rule.query.matches(id))
            .find_map(DetachmentRule::visibility)
    }

    pub fn default_for(&self, id: &CharacterizedIdentifier) -> Option<NodeIndex> {
        self.rules.iter().find_map(|rule| match rule.kind {
            RuleKind::Default(node) if rule.query.matches(id) => Some(node),
            _ => None,
        })
    }

    pub fn hides_from_search(&self, id: &CharacterizedIdentifier) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.kind == RuleKind::HideFromSearch && rule.query.matches(id))
    }

    fn same_text(&self, other: &Self) -> bool {
        self.rules.len() == other.rules.len()
            && self
                .rules
                .iter()
                .zip(&other.rules)
                .all(|(a, b)| a.text == b.text)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DetachmentChain {
    stages: Vec<DetachmentStage>,
}

impl DetachmentChain {
    /// Adjacent stages with textually identical rules collapse into one;
    /// every other stage is kept in declaration order.
    pub fn new(stages: Vec<DetachmentStage>) -> Self {
        let mut kept: Vec<DetachmentStage> = Vec::with_capacity(stages.len());
        for stage in stages {
            if kept.last().is_some_and(|last| last.same_text(&stage)) {
                continue;
            }
            kept.push(stage);
        }
        Self { stages: kept }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn stages(&self) -> &[DetachmentStage] {
        &self.stages
    }

    pub fn decide(&self, id: &CharacterizedIdentifier) -> Visibility {
        let mut decision = Visibility::Visible;
        for (position, stage) in self.stages.iter().enumerate().rev() {
            if let Some(stage_decision) = stage.decision(id) {
                trace!(identifier = %id, stage = position, ?stage_decision, "detachment stage");
                decision = stage_decision;
            }
        }
        decision
    }

    pub fn default_for(&self, id: &CharacterizedIdentifier) -> Option<NodeIndex> {
        self.stages.iter().find_map(|stage| stage.default_for(id))
    }

    pub fn hides_from_search(&self, id: &CharacterizedIdentifier) -> bool {
        self.stages.iter().any(|stage| stage.hides_from_search(id))
    }

    /// Rewrite default node references, for replay clones.
    pub(crate) fn remap_defaults(&self, mut map: impl FnMut(NodeIndex) -> NodeIndex) -> Self {
        let stages = self
            .stages
            .iter()
            .map(|stage| {
                let rules = stage
                    .rules
                    .iter()
                    .map(|rule| {
                        let kind = match rule.kind {
                            RuleKind::Default(node) => RuleKind::Default(map(node)),
                            ref other => other.clone(),
                        };
                        DetachmentRule::new(rule.query.clone(), kind, rule.text.clone())
                    })
                    .collect();
                DetachmentStage::new(rules)
            })
            .collect();
        Self { stages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CharacterizedIdentifier {
        CharacterizedIdentifier::parse(name)
    }

    fn rule(name: &str, kind: RuleKind, text: &str) -> DetachmentRule {
        DetachmentRule::new(Query::exact(id(name)), kind, text)
    }

    fn stage(rules: Vec<DetachmentRule>) -> DetachmentStage {
        DetachmentStage::new(rules)
    }

    #[test]
    fn leftmost_opinion_wins() {
        let chain = DetachmentChain::new(vec![
            stage(vec![rule("v", RuleKind::Block, "v")]),
            stage(vec![rule("v", RuleKind::Allow, "+v")]),
            stage(vec![rule("v", RuleKind::Block, "v")]),
        ]);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.decide(&id("v")), Visibility::Blocked);
        assert_eq!(chain.decide(&id("w")), Visibility::Visible);

        let chain = DetachmentChain::new(vec![
            stage(vec![rule("u", RuleKind::Block, "u")]),
            stage(vec![rule("v", RuleKind::Allow, "+v")]),
            stage(vec![rule("v", RuleKind::Block, "v")]),
        ]);
        assert_eq!(chain.decide(&id("v")), Visibility::Visible);
    }

    #[test]
    fn defaults_scan_left_to_right() {
        let chain = DetachmentChain::new(vec![
            stage(vec![rule("v", RuleKind::Default(NodeIndex(7)), "v = 7")]),
            stage(vec![rule("v", RuleKind::Default(NodeIndex(8)), "v = 8")]),
        ]);
        assert_eq!(chain.default_for(&id("v")), Some(NodeIndex(7)));
        assert_eq!(chain.default_for(&id("w")), None);
    }

    #[test]
    fn only_adjacent_identical_stages_merge() {
        let chain = DetachmentChain::new(vec![
            stage(vec![rule("v", RuleKind::Block, "v")]),
            stage(vec![rule("v", RuleKind::Block, "v")]),
            stage(vec![rule("v", RuleKind::Allow, "+v")]),
            stage(vec![rule("v", RuleKind::Block, "v")]),
        ]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn hiding_does_not_block() {
        let chain = DetachmentChain::new(vec![stage(vec![rule(
            "secret",
            RuleKind::HideFromSearch,
            "~secret",
        )])]);
        assert!(chain.hides_from_search(&id("secret")));
        assert_eq!(chain.decide(&id("secret")), Visibility::Visible);
    }
}
