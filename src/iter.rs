//! Iteration in raw slot order.
//!
//! Order is unrelated to insertion order and changes whenever the table
//! relays its entries out. Borrowing iterators hold the table borrow, so the
//! compiler rules out reallocation while they are alive. `Cursor` is the
//! detached form: it only remembers a position, which allows removals
//! between steps.

use crate::table::{HashTable, Slot};
use core::iter::FusedIterator;

type Slots<K, V> = [Option<Slot<K, V>>];

/// Iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Option<Slot<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(slots: &'a Slots<K, V>, len: usize) -> Self {
        Self {
            slots: slots.iter(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((&slot.key, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Option<Slot<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(slots: &'a mut Slots<K, V>, len: usize) -> Self {
        Self {
            slots: slots.iter_mut(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((&slot.key, &mut slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> ValuesMut<'a, K, V> {
    pub(crate) fn new(inner: IterMut<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Owning iterator; consumes the table.
pub struct IntoIter<K, V> {
    slots: std::vec::IntoIter<Option<Slot<K, V>>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(slots: Vec<Option<Slot<K, V>>>, len: usize) -> Self {
        Self {
            slots: slots.into_iter(),
            remaining: len,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        let slot = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((slot.key, slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

/// Draining iterator returned by `HashTable::drain`. Entries not consumed
/// are dropped with the iterator.
pub struct Drain<'a, K, V> {
    slots: std::vec::Drain<'a, Option<Slot<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Drain<'a, K, V> {
    pub(crate) fn new(slots: std::vec::Drain<'a, Option<Slot<K, V>>>, len: usize) -> Self {
        Self {
            slots,
            remaining: len,
        }
    }
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        let slot = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((slot.key, slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

/// Detached iteration position over a table's slot array.
///
/// A cursor holds no borrow, so entries may be removed between steps:
/// entries already passed are unaffected and removed entries not yet
/// reached are simply skipped. Any relayout (growth or compaction on insert,
/// `resize`, `shrink_to_fit`, `rehash`, `clear`, `drain`) invalidates the cursor, and
/// stepping an invalidated cursor panics.
#[derive(Copy, Clone, Debug)]
pub struct Cursor {
    next: usize,
    generation: u64,
}

impl Cursor {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            next: 0,
            generation,
        }
    }

    /// Step to the next occupied slot and return its key.
    pub fn next_key<'t, K, V, H, E>(&mut self, table: &'t HashTable<K, V, H, E>) -> Option<&'t K> {
        self.next_pair(table).map(|(k, _)| k)
    }

    /// Step to the next occupied slot and return its key and value.
    pub fn next_pair<'t, K, V, H, E>(
        &mut self,
        table: &'t HashTable<K, V, H, E>,
    ) -> Option<(&'t K, &'t V)> {
        assert!(
            self.generation == table.generation(),
            "cursor used after the table was reallocated"
        );
        let slots = table.raw_slots();
        while self.next < slots.len() {
            let index = self.next;
            self.next += 1;
            if let Some(slot) = &slots[index] {
                return Some((&slot.key, &slot.value));
            }
        }
        None
    }
}
