//! Unicellular brane computer: the stepwise execution core of Foolish.
//!
//! This crate turns an immutable syntax tree into a graph of evaluation
//! nodes and drives it one bounded step at a time:
//! - Node arena and evaluation phases (`Node`, `NodeKind`, `Nyes`)
//! - Breadth-first stepping of composite nodes (`Mind`)
//! - Scopes with positional shadowing and parent delegation (`BraneMemory`)
//! - Detachment filter chains
//! - Exact and regexp queries, search and seek
//! - Replay of abstract nodes against another scope
//! - Text rendering and JSON snapshots of finished results
//!
//! ```no_run
//! use foolish_ast::Expr;
//! use foolish_ubc::{Sequencer, Ubc};
//!
//! let program = Expr::brane(vec![Expr::assign("a", Expr::int(1))]);
//! let mut ubc = Ubc::new();
//! let root = ubc.build(&program);
//! ubc.run(root).unwrap();
//! println!("{}", Sequencer::new(&ubc).sequence(root));
//! ```

// Node storage and typed ids
pub mod arena;
pub mod node;
pub use arena::NodeArena;
pub use node::{Node, NodeIndex, NodeKind, Nyes, UnknownReason};

// Per-node work queue
pub mod mind;
pub use mind::Mind;

// Identifiers with characterization chains
pub mod identifier;
pub use identifier::CharacterizedIdentifier;

// Queries, scopes and detachment filters
pub mod detachment;
pub mod memory;
pub mod query;
pub use memory::{Binding, BraneMemory, MemoryArena, MemoryId};
pub use query::Query;

// Contract violations and runtime faults
pub mod error;
pub use error::{NodeError, RuntimeFault};

// Evaluator state and its public interface
pub mod state;
pub use state::{StepCount, Ubc, UbcOptions};
mod state_build;
mod state_detachment;
mod state_replay;
mod state_search;
mod state_step;
pub use state_step::{evaluate_binary, evaluate_unary};

// Output
pub mod sequencer;
pub mod snapshot;
pub use sequencer::{Sequencer, SequencerOptions};
pub use snapshot::{Snapshot, StatementSnapshot};
