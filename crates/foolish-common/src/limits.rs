//! Centralized limits for the Foolish execution core.
//!
//! Every bound here turns a runaway or pathological program into a
//! reported outcome instead of a hang or a stack overflow. None of them
//! affect the meaning of a program that stays within them.

// =============================================================================
// Step Bounds
// =============================================================================

/// Default number of root steps granted to `run_to_completion`.
///
/// A step is one call to `step` on the root node. Breadth-first stepping
/// means a step on the root advances exactly one pending leaf somewhere in
/// the tree, so this is roughly "units of work", not "statements".
///
/// The bound is a policy knob: callers raise it and retry when a large
/// program legitimately needs more work.
///
/// Exceeding the bound is reported as `RuntimeFault::StepLimitExceeded`.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

// =============================================================================
// Walk Bounds
// =============================================================================

/// Maximum number of scopes visited by one identifier lookup.
///
/// Scope parents are always created before their children, so the chain is
/// acyclic by construction; the bound only protects against absurdly deep
/// nesting. A walk that hits it reports "not found".
pub const MAX_SCOPE_WALK_DEPTH: u32 = 10_000;

/// Maximum number of result links followed when chasing a node to the
/// value it denotes (assignment → identifier → search → ...).
pub const MAX_TERMINAL_CHASE: u32 = 10_000;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Initial capacity reserved for the node arena of one evaluation run.
pub const NODE_ARENA_CAPACITY: usize = 256;

/// Initial capacity reserved for the scope arena of one evaluation run.
pub const MEMORY_ARENA_CAPACITY: usize = 32;
