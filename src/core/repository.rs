use std::collections::HashMap;

use super::traits::Identifiable;
use crate::utils::errors::{Result, SimError};

/// # Repository
/// An append-oriented container mapping monotonically assigned IDs to
/// entities, with insertion-order iteration and O(1) lookup.
///
/// ## Details
/// - `add_new` assigns the next free ID and returns it.
/// - Removal never renumbers surviving entities.
/// - There is no internal locking; callers batch writes outside
///   iteration windows.
#[derive(Clone)]
pub struct Repository<T: Identifiable> {
    slots: Vec<Option<T>>,
    index: HashMap<u64, usize>,
    next_id: u64,
}

impl<T: Identifiable> Default for Repository<T> {
    fn default() -> Repository<T> {
        Repository::new()
    }
}

impl<T: Identifiable> Repository<T> {
    pub fn new() -> Repository<T> {
        Repository {
            slots: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }

    /// Inserts `entity`, assigns it the next free ID and returns the ID.
    pub fn add_new(&mut self, mut entity: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        entity.assign_id(id);
        self.index.insert(id, self.slots.len());
        self.slots.push(Some(entity));
        id
    }

    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when no entity carries `id`.
    pub fn get(&self, id: u64) -> Result<&T> {
        self.try_get(id).ok_or_else(|| {
            SimError::IndexOutOfRange(format!("no entity with id {} in repository", id))
        })
    }

    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when no entity carries `id`.
    pub fn get_mut(&mut self, id: u64) -> Result<&mut T> {
        self.try_get_mut(id).ok_or_else(|| {
            SimError::IndexOutOfRange(format!("no entity with id {} in repository", id))
        })
    }

    pub fn try_get(&self, id: u64) -> Option<&T> {
        self.index
            .get(&id)
            .and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn try_get_mut(&mut self, id: u64) -> Option<&mut T> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].as_mut()
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        let slot = self.index.remove(&id)?;
        self.slots[slot].take()
    }

    /// Iterates live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Iterates live IDs in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.iter().filter_map(|entity| entity.id())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
