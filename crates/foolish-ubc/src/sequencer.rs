//! Text rendering of evaluation results.
//!
//! A brane renders as `{`, one `name = value` line per statement indented
//! one level deeper than the brane, then `}`. Anything without a knowable
//! value renders as `???`, and a reference back to a brane being rendered
//! as `↑`. The output is deterministic.

use crate::node::NodeIndex;
use crate::snapshot::Snapshot;
use crate::state::Ubc;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerOptions {
    /// One level of indentation.
    pub tab: String,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            tab: "  ".to_string(),
        }
    }
}

pub struct Sequencer<'a> {
    ubc: &'a Ubc,
    options: SequencerOptions,
}

impl<'a> Sequencer<'a> {
    pub fn new(ubc: &'a Ubc) -> Self {
        Self::with_options(ubc, SequencerOptions::default())
    }

    pub const fn with_options(ubc: &'a Ubc, options: SequencerOptions) -> Self {
        Self { ubc, options }
    }

    /// Render what `idx` denotes.
    pub fn sequence(&self, idx: NodeIndex) -> String {
        self.render(&Snapshot::capture(self.ubc, idx))
    }

    /// Render an already captured snapshot.
    pub fn render(&self, snapshot: &Snapshot) -> String {
        let mut out = String::new();
        self.write_value(&mut out, snapshot, 0);
        out
    }

    fn write_value(&self, out: &mut String, snapshot: &Snapshot, depth: usize) {
        match snapshot {
            Snapshot::Value { value } => out.push_str(&value.to_string()),
            Snapshot::Unknown { .. } | Snapshot::Pending => out.push_str("???"),
            Snapshot::Enclosing => out.push('↑'),
            Snapshot::Brane {
                characterization,
                statements,
            } => {
                if !characterization.is_empty() {
                    out.push_str(characterization);
                    out.push('\'');
                }
                let lines = statements.iter().map(|s| (s.name.as_deref(), &s.value));
                self.write_lines(out, lines, depth);
            }
            Snapshot::Matches { items } => {
                self.write_lines(out, items.iter().map(|item| (None, item)), depth);
            }
        }
    }

    fn write_lines<'s>(
        &self,
        out: &mut String,
        lines: impl ExactSizeIterator<Item = (Option<&'s str>, &'s Snapshot)>,
        depth: usize,
    ) {
        if lines.len() == 0 {
            out.push_str("{}");
            return;
        }
        out.push_str("{\n");
        for (name, value) in lines {
            self.indent(out, depth + 1);
            if let Some(name) = name {
                out.push_str(name);
                out.push_str(" = ");
            }
            self.write_value(out, value, depth + 1);
            out.push('\n');
        }
        self.indent(out, depth);
        out.push('}');
    }

    fn indent(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str(&self.options.tab);
        }
    }
}
