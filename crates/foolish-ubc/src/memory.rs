//! Brane memories: per-block scopes with positional shadowing.
//!
//! Every block owns one `BraneMemory`. Bindings are appended in strictly
//! increasing line order. A lookup at line `L` returns the latest binding
//! at or before `L`; failing that it asks the parent at the line where
//! this scope was opened, never at `L` itself.

use crate::detachment::{DetachmentChain, Visibility};
use crate::error::NodeError;
use crate::identifier::CharacterizedIdentifier;
use crate::node::NodeIndex;
use crate::query::Query;
use foolish_common::limits;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

/// Index of a scope in the [`MemoryArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryId(pub u32);

impl MemoryId {
    pub const NONE: Self = Self(u32::MAX);

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub identifier: CharacterizedIdentifier,
    pub line: u32,
    pub node: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct BraneMemory {
    parent: MemoryId,
    creation_line: u32,
    owner: NodeIndex,
    bindings: Vec<Binding>,
    // Positions into `bindings`, ascending.
    index: FxHashMap<CharacterizedIdentifier, SmallVec<[u32; 4]>>,
    detachment: DetachmentChain,
}

impl BraneMemory {
    fn new(parent: MemoryId, creation_line: u32, detachment: DetachmentChain) -> Self {
        Self {
            parent,
            creation_line,
            owner: NodeIndex::NONE,
            bindings: Vec::new(),
            index: FxHashMap::default(),
            detachment,
        }
    }

    pub const fn parent(&self) -> MemoryId {
        self.parent
    }

    /// Position in the parent at which this scope was opened.
    pub const fn creation_line(&self) -> u32 {
        self.creation_line
    }

    /// The block node this scope belongs to, if any.
    pub const fn owner(&self) -> NodeIndex {
        self.owner
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub const fn detachment(&self) -> &DetachmentChain {
        &self.detachment
    }

    fn bind(
        &mut self,
        identifier: CharacterizedIdentifier,
        line: u32,
        node: NodeIndex,
    ) -> Result<(), NodeError> {
        if let Some(last) = self.bindings.last()
            && line <= last.line
        {
            return Err(NodeError::BindingOutOfOrder {
                identifier: identifier.to_string(),
                line,
                last: last.line,
            });
        }
        let position = self.bindings.len() as u32;
        self.index
            .entry(identifier.clone())
            .or_default()
            .push(position);
        self.bindings.push(Binding {
            identifier,
            line,
            node,
        });
        Ok(())
    }

    /// The latest local binding of `id` at or before `from_line`.
    pub fn lookup_local(&self, id: &CharacterizedIdentifier, from_line: u32) -> Option<&Binding> {
        self.lookup_local_where(id, from_line, |_| true)
    }

    /// Like [`lookup_local`](Self::lookup_local), skipping bindings `accept`
    /// rejects.
    pub fn lookup_local_where(
        &self,
        id: &CharacterizedIdentifier,
        from_line: u32,
        accept: impl Fn(&Binding) -> bool,
    ) -> Option<&Binding> {
        let positions = self.index.get(id)?;
        positions
            .iter()
            .rev()
            .map(|&pos| &self.bindings[pos as usize])
            .filter(|binding| binding.line <= from_line)
            .find(|binding| accept(binding))
    }

    /// Bindings anchored searches may see: those before `limit` (all when
    /// `None`) that no detachment rule hides from search.
    pub fn searchable(&self, limit: Option<u32>) -> impl DoubleEndedIterator<Item = &Binding> + '_ {
        self.bindings.iter().filter(move |binding| {
            limit.is_none_or(|limit| binding.line < limit)
                && !self.detachment.hides_from_search(&binding.identifier)
        })
    }

    /// Dot search: declaration order, the last match wins.
    pub fn search(&self, query: &Query, limit: Option<u32>) -> Option<&Binding> {
        self.searchable(limit)
            .filter(|binding| query.matches(&binding.identifier))
            .last()
    }

    pub fn search_backward(&self, query: &Query, limit: Option<u32>) -> Option<&Binding> {
        self.searchable(limit)
            .rev()
            .find(|binding| query.matches(&binding.identifier))
    }

    pub fn search_forward(&self, query: &Query, limit: Option<u32>) -> Option<&Binding> {
        self.searchable(limit)
            .find(|binding| query.matches(&binding.identifier))
    }

    /// Every match, in declaration order.
    pub fn search_all(&self, query: &Query, limit: Option<u32>) -> Vec<&Binding> {
        self.searchable(limit)
            .filter(|binding| query.matches(&binding.identifier))
            .collect()
    }
}

/// Owns every scope of one evaluation run.
///
/// Parents are always allocated before their children, so parent links
/// point backwards in the arena and cannot form cycles.
#[derive(Clone, Debug, Default)]
pub struct MemoryArena {
    memories: Vec<BraneMemory>,
}

impl MemoryArena {
    pub fn new() -> Self {
        Self {
            memories: Vec::with_capacity(limits::MEMORY_ARENA_CAPACITY),
        }
    }

    /// A scope with no parent.
    pub fn alloc_root(&mut self) -> MemoryId {
        self.push(BraneMemory::new(MemoryId::NONE, 0, DetachmentChain::default()))
    }

    /// A scope opened at `creation_line` of `parent`.
    pub fn alloc(&mut self, parent: MemoryId, creation_line: u32) -> MemoryId {
        self.alloc_detached(parent, creation_line, DetachmentChain::default())
    }

    pub fn alloc_detached(
        &mut self,
        parent: MemoryId,
        creation_line: u32,
        detachment: DetachmentChain,
    ) -> MemoryId {
        debug_assert!(parent.is_none() || (parent.0 as usize) < self.memories.len());
        self.push(BraneMemory::new(parent, creation_line, detachment))
    }

    fn push(&mut self, memory: BraneMemory) -> MemoryId {
        let id = MemoryId(self.memories.len() as u32);
        self.memories.push(memory);
        id
    }

    pub fn get(&self, id: MemoryId) -> Option<&BraneMemory> {
        if id.is_none() {
            return None;
        }
        self.memories.get(id.0 as usize)
    }

    pub fn memory(&self, id: MemoryId) -> Result<&BraneMemory, NodeError> {
        self.get(id).ok_or(NodeError::UnknownScope(id))
    }

    fn memory_mut(&mut self, id: MemoryId) -> Result<&mut BraneMemory, NodeError> {
        if id.is_none() {
            return Err(NodeError::UnknownScope(id));
        }
        self.memories
            .get_mut(id.0 as usize)
            .ok_or(NodeError::UnknownScope(id))
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn bind(
        &mut self,
        memory: MemoryId,
        identifier: CharacterizedIdentifier,
        line: u32,
        node: NodeIndex,
    ) -> Result<(), NodeError> {
        trace!(?memory, identifier = %identifier, line, ?node, "bind");
        self.memory_mut(memory)?.bind(identifier, line, node)
    }

    pub(crate) fn set_owner(&mut self, memory: MemoryId, owner: NodeIndex) -> Result<(), NodeError> {
        self.memory_mut(memory)?.owner = owner;
        Ok(())
    }

    /// The node bound to `id` as seen from `from_line` of `memory`.
    pub fn lookup(
        &self,
        memory: MemoryId,
        id: &CharacterizedIdentifier,
        from_line: u32,
    ) -> Option<NodeIndex> {
        self.resolve(memory, id, from_line, |_| true)
    }

    /// Lookup that skips candidate nodes `accept` rejects, continuing to
    /// earlier bindings and then to the parent.
    pub fn resolve(
        &self,
        memory: MemoryId,
        id: &CharacterizedIdentifier,
        from_line: u32,
        accept: impl Fn(NodeIndex) -> bool,
    ) -> Option<NodeIndex> {
        let mut current = memory;
        let mut line = from_line;
        for _ in 0..limits::MAX_SCOPE_WALK_DEPTH {
            let scope = self.get(current)?;
            if let Some(binding) = scope.lookup_local_where(id, line, |b| accept(b.node)) {
                return Some(binding.node);
            }
            if scope.parent.is_none() {
                return None;
            }
            if !scope.detachment.is_empty()
                && scope.detachment.decide(id) == Visibility::Blocked
            {
                let default = scope.detachment.default_for(id).filter(|&n| accept(n));
                debug!(identifier = %id, ?current, defaulted = default.is_some(), "blocked by detachment");
                return default;
            }
            line = scope.creation_line;
            current = scope.parent;
        }
        warn!(identifier = %id, "scope walk exceeded {} levels", limits::MAX_SCOPE_WALK_DEPTH);
        None
    }
}
