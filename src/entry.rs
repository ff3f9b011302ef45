//! Entry API: the result of a single probe for an owned key.
//!
//! A `VacantEntry` can only be obtained from a lookup that failed, and it
//! holds the table's exclusive borrow, so nothing can insert the key in
//! between. That makes it the checked form of `insert_unique`: the insert
//! reuses the vacancy found by the lookup instead of probing again.

use crate::error::TableError;
use crate::table::HashTable;

pub enum Entry<'a, K, V, H, E> {
    Occupied(OccupiedEntry<'a, K, V, H, E>),
    Vacant(VacantEntry<'a, K, V, H, E>),
}

pub struct OccupiedEntry<'a, K, V, H, E> {
    table: &'a mut HashTable<K, V, H, E>,
    index: usize,
}

/// Proof that `key` was absent when the table was last probed.
pub struct VacantEntry<'a, K, V, H, E> {
    table: &'a mut HashTable<K, V, H, E>,
    key: K,
    hash: u64,
    hint: Option<(usize, usize)>,
}

impl<'a, K, V, H, E> Entry<'a, K, V, H, E> {
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(o) => o.key(),
            Entry::Vacant(v) => v.key(),
        }
    }

    pub fn or_insert(self, default: V) -> Result<&'a mut V, TableError> {
        match self {
            Entry::Occupied(o) => Ok(o.into_mut()),
            Entry::Vacant(v) => v.insert(default),
        }
    }

    /// Like `or_insert`, but `default` only runs when the key is absent.
    pub fn or_insert_with<F>(self, default: F) -> Result<&'a mut V, TableError>
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(o) => Ok(o.into_mut()),
            Entry::Vacant(v) => v.insert(default()),
        }
    }

    pub fn or_default(self) -> Result<&'a mut V, TableError>
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    pub fn and_modify<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        if let Entry::Occupied(o) = &mut self {
            f(o.get_mut());
        }
        self
    }
}

impl<'a, K, V, H, E> OccupiedEntry<'a, K, V, H, E> {
    pub(crate) fn new(table: &'a mut HashTable<K, V, H, E>, index: usize) -> Self {
        Self { table, index }
    }

    pub fn key(&self) -> &K {
        &self.table.slot(self.index).key
    }

    pub fn get(&self) -> &V {
        &self.table.slot(self.index).value
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.slot_mut(self.index).value
    }

    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { table, index } = self;
        &mut table.slot_mut(index).value
    }

    /// Replace the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    pub fn remove_entry(self) -> (K, V) {
        self.table
            .take_slot(self.index)
            .expect("occupied entry must refer to a live slot")
    }
}

impl<'a, K, V, H, E> VacantEntry<'a, K, V, H, E> {
    pub(crate) fn new(
        table: &'a mut HashTable<K, V, H, E>,
        key: K,
        hash: u64,
        hint: Option<(usize, usize)>,
    ) -> Self {
        Self {
            table,
            key,
            hash,
            hint,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    /// Insert `value` under the proven-absent key. On error the table is
    /// unchanged and the key and value are dropped.
    pub fn insert(self, value: V) -> Result<&'a mut V, TableError> {
        let VacantEntry {
            table,
            key,
            hash,
            hint,
        } = self;
        table
            .place(hash, key, value, hint)
            .map(|slot| &mut slot.value)
    }
}
