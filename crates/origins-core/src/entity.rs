//! Entity handles used as owner back-references.
//!
//! Neither an [`OriginComponent`](crate::component::OriginComponent) nor its
//! powers own the entity they belong to. They hold an [`EntityId`], a 64-bit
//! generational handle (`[generation: u32 | index: u32]`) that the host can
//! check for staleness after the entity is gone.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Pack an index and generation into a handle.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// Slot index (lower 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation counter (upper 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The packed `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from [`to_raw`](Self::to_raw) output.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Serializable allocator state: one generation and liveness flag per slot,
/// plus the FIFO free list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorState {
    pub generations: Vec<u32>,
    pub alive: Vec<bool>,
    pub free_indices: Vec<u32>,
}

/// Hands out [`EntityId`]s, recycling freed slots with a bumped generation.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    /// Create an allocator with no slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle, reusing the oldest freed slot when there is one.
    pub fn allocate(&mut self) -> EntityId {
        match self.free_indices.pop_front() {
            Some(index) => {
                self.alive[index as usize] = true;
                EntityId::new(index, self.generations[index as usize])
            }
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.alive.push(true);
                EntityId::new(index, 0)
            }
        }
    }

    /// Free `id`. Returns `false` if it was already dead or stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        true
    }

    /// `true` iff `id` refers to a live slot with a matching generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation()
    }

    /// Number of live handles.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    /// Every currently alive handle, in index order.
    pub fn alive_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| EntityId::new(idx as u32, self.generations[idx]))
    }

    /// Capture the allocator for a snapshot.
    pub fn state(&self) -> AllocatorState {
        AllocatorState {
            generations: self.generations.clone(),
            alive: self.alive.clone(),
            free_indices: self.free_indices.iter().copied().collect(),
        }
    }

    /// Rebuild an allocator from a captured [`AllocatorState`].
    ///
    /// Returns `None` if the state is inconsistent: length mismatch, a free
    /// index out of range or marked alive, or a free index listed twice. A
    /// repeated free index would hand out the same live handle twice.
    pub fn from_state(state: &AllocatorState) -> Option<Self> {
        if state.generations.len() != state.alive.len() {
            return None;
        }
        let mut seen = HashSet::with_capacity(state.free_indices.len());
        for &idx in &state.free_indices {
            if state.alive.get(idx as usize) != Some(&false) || !seen.insert(idx) {
                return None;
            }
        }
        Some(Self {
            generations: state.generations.clone(),
            alive: state.alive.clone(),
            free_indices: state.free_indices.iter().copied().collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recycled_slot_gets_new_generation() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.allocate();
        assert!(alloc.deallocate(first));
        let second = alloc.allocate();
        assert_eq!(second.index(), first.index());
        assert_eq!(second.generation(), first.generation() + 1);
        assert!(!alloc.is_alive(first));
        assert!(alloc.is_alive(second));
    }

    #[test]
    fn double_free_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
    }

    #[test]
    fn alive_ids_lists_live_handles() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        alloc.deallocate(b);
        assert_eq!(alloc.alive_ids().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(alloc.alive_count(), 2);
    }

    #[test]
    fn state_roundtrip_preserves_free_list() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let _b = alloc.allocate();
        alloc.deallocate(a);

        let mut restored = EntityAllocator::from_state(&alloc.state()).unwrap();
        let next = restored.allocate();
        assert_eq!(next, EntityId::new(a.index(), 1));
    }

    #[test]
    fn inconsistent_state_is_rejected() {
        let state = AllocatorState {
            generations: vec![0, 0],
            alive: vec![true, true],
            free_indices: vec![1],
        };
        assert!(EntityAllocator::from_state(&state).is_none());

        let state = AllocatorState {
            generations: vec![0],
            alive: vec![],
            free_indices: vec![],
        };
        assert!(EntityAllocator::from_state(&state).is_none());

        let state = AllocatorState {
            generations: vec![0],
            alive: vec![false],
            free_indices: vec![0, 0],
        };
        assert!(EntityAllocator::from_state(&state).is_none());
    }

    #[test]
    fn restored_allocator_never_repeats_a_live_handle() {
        let mut alloc = EntityAllocator::new();
        let ids: Vec<EntityId> = (0..4).map(|_| alloc.allocate()).collect();
        alloc.deallocate(ids[2]);
        alloc.deallocate(ids[0]);

        let mut restored = EntityAllocator::from_state(&alloc.state()).unwrap();
        let a = restored.allocate();
        let b = restored.allocate();
        let c = restored.allocate();
        assert_ne!(a, b);
        assert_eq!((a.index(), b.index(), c.index()), (2, 0, 4));
        assert_eq!(restored.alive_count(), 5);
    }

    #[test]
    fn raw_roundtrip() {
        let id = EntityId::new(7, 3);
        assert_eq!(EntityId::from_raw(id.to_raw()), id);
        assert_eq!(id.to_string(), "entity#7v3");
    }
}
