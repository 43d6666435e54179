//! Generational arena storage for world entities
//!
//! Handles carry an index plus the slot generation at insertion time. A purge
//! bumps the slot generation, so any handle held across a script invocation
//! resolves to `None` afterwards instead of aliasing a recycled slot. This is
//! what makes the post-invocation liveness re-check a plain lookup.

use serde::{Deserialize, Serialize};

/// Raw handle into an arena: slot index plus generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawId {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena with generation-checked handles
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> RawId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            RawId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            RawId {
                index,
                generation: 0,
            }
        }
    }

    pub fn get(&self, id: RawId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: RawId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, id: RawId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a value, invalidating every outstanding handle to it
    pub fn remove(&mut self, id: RawId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.value.is_none() {
            return None;
        }
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        value
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (RawId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    RawId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut arena = Arena::new();
        let id = arena.insert("wolf");
        assert_eq!(arena.get(id), Some(&"wolf"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_remove() {
        let mut arena = Arena::new();
        let id = arena.insert("wolf");
        assert_eq!(arena.remove(id), Some("wolf"));
        assert!(arena.get(id).is_none());
        assert!(!arena.contains(id));
    }

    #[test]
    fn test_slot_reuse_does_not_resurrect_handle() {
        let mut arena = Arena::new();
        let old = arena.insert("wolf");
        arena.remove(old);

        let new = arena.insert("bear");
        // Same slot, different generation
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new), Some(&"bear"));
    }

    #[test]
    fn test_double_remove_is_none() {
        let mut arena = Arena::new();
        let id = arena.insert(1);
        assert!(arena.remove(id).is_some());
        assert!(arena.remove(id).is_none());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_iter_skips_removed() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        let c = arena.insert("c");
        arena.remove(b);

        let ids: Vec<RawId> = arena.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, c]);
    }
}
