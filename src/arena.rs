//! Arena - generation-checked slot storage for linked nodes
//!
//! Nodes of the list and the tree live in a `Vec` of slots and refer to each
//! other by `Id` rather than by reference or pointer. An `Id` captures the
//! slot index and the slot's generation at hand-out. Vacating a slot bumps
//! its generation, so an `Id` issued for a removed element can never
//! revalidate against whatever occupies the slot next. This is what lets the
//! public cursor types detect use-after-remove instead of silently
//! addressing a different element.
//!
//! Freed slots are recycled through a free list, so long-lived containers
//! with churn do not grow without bound.

/// Handle to an occupied slot. Compares equal only to handles of the same
/// slot at the same generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Id {
    slot: u32,
    generation: u64,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u64,
    value: Option<T>,
}

/// Slab of generation-tagged slots with free-list reuse.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Count of live (occupied) slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a value, reusing a vacated slot when one is available.
    pub(crate) fn insert(&mut self, value: T) -> Id {
        match self.free.pop() {
            Some(slot) => {
                let s = &mut self.slots[slot as usize];
                debug_assert!(s.value.is_none());
                s.value = Some(value);
                Id {
                    slot,
                    generation: s.generation,
                }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                Id {
                    slot,
                    generation: 0,
                }
            }
        }
    }

    /// Take the value out of a slot and advance its generation. `None` if
    /// the handle is stale or out of range.
    pub(crate) fn remove(&mut self, id: Id) -> Option<T> {
        let s = self.slots.get_mut(id.slot as usize)?;
        if s.generation != id.generation {
            return None;
        }
        debug_assert!(s.value.is_some());
        s.generation += 1;
        self.free.push(id.slot);
        s.value.take()
    }

    pub(crate) fn get(&self, id: Id) -> Option<&T> {
        let s = self.slots.get(id.slot as usize)?;
        if s.generation != id.generation {
            return None;
        }
        s.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        let s = self.slots.get_mut(id.slot as usize)?;
        if s.generation != id.generation {
            return None;
        }
        s.value.as_mut()
    }

    pub(crate) fn contains(&self, id: Id) -> bool {
        self.get(id).is_some()
    }

    /// Vacate every occupied slot. Each one has its generation advanced
    /// individually, so handles issued before the clear stay detectably
    /// stale even once the slots are reoccupied.
    pub(crate) fn clear(&mut self) {
        for (idx, s) in self.slots.iter_mut().enumerate() {
            if s.value.take().is_some() {
                s.generation += 1;
                self.free.push(idx as u32);
            }
        }
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn test_arena_basic() {
        let mut arena: Arena<u64> = Arena::new();
        assert!(arena.is_empty());

        let a = arena.insert(10);
        let b = arena.insert(20);
        assert!(arena.len() == 2);
        assert!(arena.get(a) == Some(&10));
        assert!(arena.get(b) == Some(&20));
        assert!(a != b);

        *arena.get_mut(a).unwrap() = 11;
        assert!(arena.get(a) == Some(&11));

        assert!(arena.remove(a) == Some(11));
        assert!(arena.len() == 1);
        assert!(arena.get(b) == Some(&20));
    }

    #[test]
    fn test_arena_stale_handle() {
        let mut arena: Arena<u64> = Arena::new();
        let a = arena.insert(1);
        assert!(arena.remove(a) == Some(1));

        // The slot is vacated. Every use of the old handle must fail.
        assert!(arena.get(a).is_none());
        assert!(arena.get_mut(a).is_none());
        assert!(arena.remove(a).is_none());
        assert!(!arena.contains(a));

        // Reoccupying the same slot must not resurrect the old handle.
        let b = arena.insert(2);
        assert!(arena.get(a).is_none());
        assert!(arena.get(b) == Some(&2));
        assert!(a != b);
    }

    #[test]
    fn test_arena_slot_reuse() {
        let mut arena: Arena<u64> = Arena::new();
        let ids: Vec<_> = (0..8).map(|v| arena.insert(v)).collect();
        for id in ids.iter() {
            assert!(arena.remove(*id).is_some());
        }
        assert!(arena.is_empty());

        // Reinsertion fills vacated slots rather than growing the slab.
        let _ids: Vec<_> = (0..8).map(|v| arena.insert(v)).collect();
        assert!(arena.len() == 8);
        assert!(arena.slots.len() == 8);
    }

    #[test]
    fn test_arena_clear() {
        let mut arena: Arena<u64> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_none());

        let c = arena.insert(3);
        assert!(arena.get(a).is_none());
        assert!(arena.get(c) == Some(&3));
    }

    #[test]
    fn test_arena_clone_independent() {
        let mut arena: Arena<u64> = Arena::new();
        let a = arena.insert(1);
        let mut copy = arena.clone();
        *copy.get_mut(a).unwrap() = 9;
        assert!(arena.get(a) == Some(&1));
        assert!(copy.get(a) == Some(&9));
    }
}
