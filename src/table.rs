//! HashTable: open addressing over a power-of-two slot array.
//!
//! Layout and invariants
//! - `slots.len()` is the capacity: 0 or a power of two.
//! - `len` counts occupied slots; no key occupies two slots.
//! - Each slot stores the key's 64-bit hash; folding it with `fib_index`
//!   gives the home index, and the slot lies on the probe walk
//!   `home + n^2 (mod capacity)` within `max_probe` steps.
//! - Removal clears the slot in place (no tombstones). Until the next
//!   relayout, lookups then walk past empty slots up to `max_probe`
//!   steps, since a cleared slot may sit in the middle of another key's
//!   walk.
//! - Every relayout (growth, `resize`, `shrink_to_fit`, `rehash`) moves all
//!   entries into a fresh array and bumps `generation`.
//! - Once a quarter of the capacity has been removed since the last
//!   relayout, the next new key compacts the table first. Removal itself
//!   never relays out, so cursors survive it.

use crate::entry::{Entry, OccupiedEntry, VacantEntry};
use crate::error::{try_vec, TableError};
use crate::hash::{fib_index, KeyEq, KeyHasher, Poly151, StdEq};
use crate::iter::{Cursor, Drain, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use core::borrow::Borrow;
use core::fmt;
use core::ops::Index;
use log::{debug, trace};

/// Capacity allocated by the first insertion into an empty table.
pub const INITIAL_CAPACITY: usize = 32;

#[derive(Clone, Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

/// Outcome of walking a key's probe sequence.
enum Probe {
    Found(usize),
    /// First empty slot on the walk and the step it was reached at.
    Vacant { index: usize, steps: usize },
    /// No match and no empty slot within the walk (or no slots at all).
    Unplaced,
}

/// Target index for every occupied slot, in slot order.
struct Layout {
    targets: Vec<usize>,
    max_probe: usize,
}

/// Visits `home, home + 1, home + 4, home + 9, ...` (mod `mask + 1`) for at
/// most `limit` steps; returns the first `(index, step)` accepted by `stop`.
#[inline]
fn walk(
    home: usize,
    mask: usize,
    limit: usize,
    mut stop: impl FnMut(usize, usize) -> bool,
) -> Option<(usize, usize)> {
    let mut index = home;
    for step in 0..limit {
        if stop(index, step) {
            return Some((index, step));
        }
        index = (index + (step << 1) + 1) & mask;
    }
    None
}

fn try_slots<K, V>(capacity: usize) -> Result<Vec<Option<Slot<K, V>>>, TableError> {
    let mut slots = try_vec(capacity)?;
    slots.resize_with(capacity, || None);
    Ok(slots)
}

/// Open-addressing hash table with Fibonacci hashing and quadratic probing.
///
/// `H` hashes keys and `E` compares them; the defaults hash the key's bytes
/// with `poly151` and compare with `PartialEq`, which suits `String`,
/// `Box<str>`, `Vec<u8>` and `Box<[u8]>` keys. For other key types use
/// [`Hashed`](crate::Hashed).
///
/// References returned by lookups borrow the table, so they cannot outlive
/// the next mutation.
#[derive(Clone)]
pub struct HashTable<K, V, H = Poly151, E = StdEq> {
    slots: Vec<Option<Slot<K, V>>>,
    len: usize,
    max_probe: usize,
    has_holes: bool,
    removed: usize,
    generation: u64,
    hasher: H,
    eq: E,
}

impl<K, V> HashTable<K, V> {
    /// Create an empty table. No memory is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_policies(Poly151, StdEq)
    }
}

impl<K, V, H, E> Default for HashTable<K, V, H, E>
where
    H: Default,
    E: Default,
{
    fn default() -> Self {
        Self::with_policies(H::default(), E::default())
    }
}

impl<K, V, H, E> HashTable<K, V, H, E> {
    pub fn with_hasher(hasher: H) -> Self
    where
        E: Default,
    {
        Self::with_policies(hasher, E::default())
    }

    pub fn with_policies(hasher: H, eq: E) -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            max_probe: 0,
            has_holes: false,
            removed: 0,
            generation: 0,
            hasher,
            eq,
        }
    }

    /// Create a table with at least `capacity` slots (rounded up to a power
    /// of two).
    pub fn with_capacity(capacity: usize) -> Result<Self, TableError>
    where
        H: Default,
        E: Default,
    {
        let mut table = Self::default();
        table.resize(capacity)?;
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots: 0 or a power of two.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.len as f64 / self.slots.len() as f64
        }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.eq
    }

    /// Drop every entry and release the slot array (capacity becomes 0).
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.reset_counters();
    }

    fn reset_counters(&mut self) {
        self.len = 0;
        self.max_probe = 0;
        self.has_holes = false;
        self.removed = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Grow to at least `min_capacity` slots, rounded up to a power of two.
    /// Never shrinks; a request at or below the current capacity is a no-op.
    pub fn resize(&mut self, min_capacity: usize) -> Result<(), TableError> {
        if min_capacity == 0 {
            return Ok(());
        }
        let target = min_capacity
            .checked_next_power_of_two()
            .ok_or(TableError::CapacityOverflow)?;
        if target <= self.slots.len() {
            return Ok(());
        }
        self.relayout(target, None)
    }

    /// Move entries into the smallest power of two that holds them. An empty
    /// table releases its array. If some probe walk cannot be placed there,
    /// the next doubling that fits is used instead. Never grows: if no
    /// smaller capacity fits, the table is left as is.
    pub fn shrink_to_fit(&mut self) -> Result<(), TableError> {
        if self.len == 0 {
            if !self.slots.is_empty() {
                self.clear();
            }
            return Ok(());
        }
        let current = self.slots.len();
        let target = self
            .len
            .checked_next_power_of_two()
            .ok_or(TableError::CapacityOverflow)?;
        if target >= current {
            return Ok(());
        }
        self.relayout(target, Some(current))
    }

    /// Rebuild the layout, dropping the probe-walk slack left behind by
    /// removals. A `min_capacity` above the current capacity grows the table
    /// like [`HashTable::resize`]; otherwise the capacity is kept.
    pub fn rehash(&mut self, min_capacity: usize) -> Result<(), TableError> {
        let current = self.slots.len();
        if min_capacity > current {
            return self.resize(min_capacity);
        }
        if current == 0 {
            return Ok(());
        }
        self.relayout(current, None)
    }

    /// Lay the entries out in `capacity` slots, doubling while some entry
    /// finds no free slot on its walk. Leaves the table untouched if that
    /// would reach `ceiling`.
    fn relayout(&mut self, mut capacity: usize, ceiling: Option<usize>) -> Result<(), TableError> {
        loop {
            if ceiling.is_some_and(|limit| capacity >= limit) {
                return Ok(());
            }
            if let Some(layout) = self.plan(capacity)? {
                return self.adopt(capacity, layout);
            }
            debug!(
                "no probe walk fits {} entries in {} slots; doubling",
                self.len, capacity
            );
            capacity = capacity
                .checked_mul(2)
                .ok_or(TableError::CapacityOverflow)?;
        }
    }

    /// Decide where every entry goes in a `capacity`-slot array without
    /// moving anything.
    fn plan(&self, capacity: usize) -> Result<Option<Layout>, TableError> {
        debug_assert!(capacity.is_power_of_two());
        let mask = capacity - 1;
        let mut taken: Vec<bool> = try_vec(capacity)?;
        taken.resize(capacity, false);
        let mut targets: Vec<usize> = try_vec(self.len)?;
        let mut max_probe = 0;
        for slot in self.slots.iter().flatten() {
            let home = fib_index(slot.hash, capacity);
            match walk(home, mask, capacity, |i, _| !taken[i]) {
                Some((index, steps)) => {
                    taken[index] = true;
                    targets.push(index);
                    max_probe = max_probe.max(steps);
                }
                None => return Ok(None),
            }
        }
        Ok(Some(Layout { targets, max_probe }))
    }

    fn adopt(&mut self, capacity: usize, layout: Layout) -> Result<(), TableError> {
        let mut fresh = try_slots(capacity)?;
        let occupied = self.slots.iter_mut().filter(|s| s.is_some());
        for (slot, &to) in occupied.zip(&layout.targets) {
            fresh[to] = slot.take();
        }
        trace!(
            "relayout {} -> {} slots ({} entries, max probe {})",
            self.slots.len(),
            capacity,
            self.len,
            layout.max_probe
        );
        self.slots = fresh;
        self.max_probe = layout.max_probe;
        self.has_holes = false;
        self.removed = 0;
        self.generation = self.generation.wrapping_add(1);
        Ok(())
    }

    /// Enough removals since the last relayout that lookups are paying for
    /// the holes.
    fn needs_compaction(&self) -> bool {
        self.has_holes && self.removed >= self.slots.len() / 4
    }

    fn over_threshold(&self) -> bool {
        // Load factor limit 0.75, counting the entry about to be placed.
        (self.len + 1).saturating_mul(4) > self.slots.len().saturating_mul(3)
    }

    /// First empty slot on the walk for `hash`, searching the whole cycle.
    fn vacant_for(&self, hash: u64) -> Option<(usize, usize)> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return None;
        }
        walk(fib_index(hash, capacity), capacity - 1, capacity, |i, _| {
            self.slots[i].is_none()
        })
    }

    /// Place an entry whose key is known to be absent. `hint` is a vacancy
    /// found by a preceding lookup and is only trusted if no relayout
    /// happens first.
    pub(crate) fn place(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        mut hint: Option<(usize, usize)>,
    ) -> Result<&mut Slot<K, V>, TableError> {
        if self.slots.is_empty() {
            self.relayout(INITIAL_CAPACITY, None)?;
            hint = None;
        } else if self.over_threshold() {
            let grown = self
                .slots
                .len()
                .checked_mul(2)
                .ok_or(TableError::CapacityOverflow)?;
            self.relayout(grown, None)?;
            hint = None;
        } else if self.needs_compaction() {
            let capacity = self.slots.len();
            // Best effort: on failure the holes stay and the hint is still valid.
            if self.relayout(capacity, None).is_ok() {
                hint = None;
            }
        }
        loop {
            let spot = hint.take().or_else(|| self.vacant_for(hash));
            if let Some((index, steps)) = spot {
                self.len += 1;
                self.max_probe = self.max_probe.max(steps);
                return Ok(self.slots[index].insert(Slot { key, value, hash }));
            }
            let capacity = self.slots.len();
            debug!("probe walk exhausted at capacity {}; growing", capacity);
            let grown = capacity
                .checked_mul(2)
                .ok_or(TableError::CapacityOverflow)?;
            self.relayout(grown, None)?;
        }
    }

    pub(crate) fn slot(&self, index: usize) -> &Slot<K, V> {
        self.slots[index]
            .as_ref()
            .expect("occupied index must refer to a live slot")
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Slot<K, V> {
        self.slots[index]
            .as_mut()
            .expect("occupied index must refer to a live slot")
    }

    /// Clear slot `index` in place.
    pub(crate) fn take_slot(&mut self, index: usize) -> Option<(K, V)> {
        let slot = self.slots[index].take()?;
        self.len -= 1;
        if self.len == 0 {
            // Nothing left whose walk could cross the hole.
            self.max_probe = 0;
            self.has_holes = false;
            self.removed = 0;
        } else {
            self.has_holes = true;
            self.removed += 1;
        }
        Some((slot.key, slot.value))
    }

    /// Keep only entries for which `f` returns true. Never reallocates.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        for index in 0..self.slots.len() {
            let keep = match &mut self.slots[index] {
                Some(slot) => f(&slot.key, &mut slot.value),
                None => true,
            };
            if !keep {
                let _ = self.take_slot(index);
            }
        }
    }

    /// Remove every entry, yielding them in slot order. The table is empty
    /// with capacity 0 afterwards.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let remaining = self.len;
        self.reset_counters();
        Drain::new(self.slots.drain(..), remaining)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.slots, self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.slots, self.len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.iter_mut())
    }

    /// Detached iteration position; see [`Cursor`].
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.generation)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn raw_slots(&self) -> &[Option<Slot<K, V>>] {
        &self.slots
    }

    fn locate<Q>(&self, hash: u64, key: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: KeyEq<Q>,
    {
        let capacity = self.slots.len();
        if capacity == 0 {
            return Probe::Unplaced;
        }
        let mut vacant: Option<(usize, usize)> = None;
        let stop_at_empty = !self.has_holes;
        let hit = walk(
            fib_index(hash, capacity),
            capacity - 1,
            self.max_probe + 1,
            |i, step| match &self.slots[i] {
                Some(slot) => {
                    slot.hash == hash && self.eq.key_eq(Borrow::<Q>::borrow(&slot.key), key)
                }
                None => {
                    if vacant.is_none() {
                        vacant = Some((i, step));
                    }
                    stop_at_empty
                }
            },
        );
        match hit {
            Some((index, _)) if self.slots[index].is_some() => Probe::Found(index),
            _ => match vacant {
                Some((index, steps)) => Probe::Vacant { index, steps },
                None => Probe::Unplaced,
            },
        }
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let hash = self.hasher.hash_key(key);
        match self.locate(hash, key) {
            Probe::Found(index) => Some(index),
            _ => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.find_index(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let index = self.find_index(key)?;
        Some(&self.slot(index).value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let index = self.find_index(key)?;
        let slot = self.slot(index);
        Some((&slot.key, &slot.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let index = self.find_index(key)?;
        Some(&mut self.slot_mut(index).value)
    }

    /// Remove `key`, returning its value. Absent keys leave the table
    /// untouched.
    ///
    /// The slot is cleared in place. Until the next relayout, misses and
    /// new-key inserts walk the full `max_probe` bound instead of stopping
    /// at the first empty slot; the insert after a quarter of the capacity
    /// has been removed compacts the table.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let index = self.find_index(key)?;
        self.take_slot(index)
    }
}

impl<K, V, H, E> HashTable<K, V, H, E>
where
    H: KeyHasher<K>,
    E: KeyEq<K>,
{
    /// Insert or overwrite. Returns the previous value for `key`, if any.
    /// On error the table is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let hash = self.hasher.hash_key(&key);
        match self.locate(hash, &key) {
            Probe::Found(index) => {
                let slot = self.slot_mut(index);
                Ok(Some(core::mem::replace(&mut slot.value, value)))
            }
            Probe::Vacant { index, steps } => {
                self.place(hash, key, value, Some((index, steps)))?;
                Ok(None)
            }
            Probe::Unplaced => {
                self.place(hash, key, value, None)?;
                Ok(None)
            }
        }
    }

    /// Insert a key the caller guarantees is absent, skipping the lookup.
    ///
    /// Debug builds check the guarantee and panic on a duplicate; release
    /// builds would store the key twice. [`HashTable::entry`] gives the same
    /// single-probe insert with the absence proven by a lookup.
    pub fn insert_unique(&mut self, key: K, value: V) -> Result<&mut V, TableError> {
        debug_assert!(
            !self.contains_key(&key),
            "insert_unique called with a key already present"
        );
        let hash = self.hasher.hash_key(&key);
        self.place(hash, key, value, None).map(|slot| &mut slot.value)
    }

    /// Insert without overwriting; a present key is reported as
    /// `TableError::DuplicateKey` and the table is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<&mut V, TableError> {
        match self.entry(key) {
            Entry::Occupied(_) => Err(TableError::DuplicateKey),
            Entry::Vacant(vacant) => vacant.insert(value),
        }
    }

    /// Probe once for `key`. A vacant entry is the proof that `key` is
    /// absent and inserts without probing again.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, H, E> {
        let hash = self.hasher.hash_key(&key);
        match self.locate(hash, &key) {
            Probe::Found(index) => Entry::Occupied(OccupiedEntry::new(self, index)),
            Probe::Vacant { index, steps } => {
                Entry::Vacant(VacantEntry::new(self, key, hash, Some((index, steps))))
            }
            Probe::Unplaced => Entry::Vacant(VacantEntry::new(self, key, hash, None)),
        }
    }

    /// Value for `key`, inserting `V::default()` first if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V, TableError>
    where
        V: Default,
    {
        self.entry(key).or_default()
    }
}

impl<K, V, H, E> fmt::Debug for HashTable<K, V, H, E>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, H, E> PartialEq for HashTable<K, V, H, E>
where
    V: PartialEq,
    H: KeyHasher<K>,
    E: KeyEq<K>,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        self.iter()
            .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl<K, V, H, E> Eq for HashTable<K, V, H, E>
where
    V: Eq,
    H: KeyHasher<K>,
    E: KeyEq<K>,
{
}

/// Lookup that panics with "key not present" when `key` is absent.
impl<K, V, H, E, Q> Index<&Q> for HashTable<K, V, H, E>
where
    K: Borrow<Q>,
    Q: ?Sized,
    H: KeyHasher<Q>,
    E: KeyEq<Q>,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present")
    }
}

impl<K, V, H, E> Extend<(K, V)> for HashTable<K, V, H, E>
where
    H: KeyHasher<K>,
    E: KeyEq<K>,
{
    /// Panics if inserting an element fails to allocate; use `insert` to
    /// handle that case. An unsatisfiable size hint is ignored.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        // Room for the batch under the 0.75 load limit; skipped if the hint
        // cannot be reserved.
        let wanted = self
            .len
            .checked_add(lower)
            .and_then(|n| n.checked_mul(4))
            .map(|n| n / 3 + 1);
        if let Some(wanted) = wanted.filter(|_| lower > 0) {
            if let Err(e) = self.resize(wanted) {
                debug!("extend: ignoring size hint of {} ({})", lower, e);
            }
        }
        for (k, v) in iter {
            if let Err(e) = self.insert(k, v) {
                panic!("HashTable::extend: {}", e);
            }
        }
    }
}

impl<K, V, H, E> FromIterator<(K, V)> for HashTable<K, V, H, E>
where
    H: KeyHasher<K> + Default,
    E: KeyEq<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<K, V, H, E> IntoIterator for HashTable<K, V, H, E> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter::new(self.slots, self.len)
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a HashTable<K, V, H, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a mut HashTable<K, V, H, E> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Hashed;
    use std::collections::BTreeSet;

    /// Every key lands on home index 0 in every capacity.
    #[derive(Clone, Copy, Default)]
    struct ZeroHash;
    impl<Q: ?Sized> KeyHasher<Q> for ZeroHash {
        fn hash_key(&self, _key: &Q) -> u64 {
            0
        }
    }

    fn assert_shape<K, V, H, E>(t: &HashTable<K, V, H, E>) {
        let cap = t.capacity();
        assert!(cap == 0 || cap.is_power_of_two(), "capacity {} not a power of two", cap);
        assert!(t.len() <= cap);
        assert_eq!(t.raw_slots().iter().flatten().count(), t.len());
    }

    #[test]
    fn new_table_is_empty_and_unallocated() {
        let t: HashTable<String, String> = HashTable::new();
        assert!(t.is_empty());
        assert_eq!(t.capacity(), 0);
        assert_eq!(t.load_factor(), 0.0);
        assert!(t.get("anything").is_none());
        assert!(!t.contains_key("anything"));
    }

    #[test]
    fn insert_search_remove_roundtrip() {
        let mut t: HashTable<String, String> = HashTable::new();
        assert_eq!(t.insert("hello".into(), "world".into()).unwrap(), None);
        assert!(t.contains_key("hello"));
        assert_eq!(t.get("hello").map(String::as_str), Some("world"));
        assert_eq!(t.capacity(), INITIAL_CAPACITY);
        assert_eq!(t.remove("hello").as_deref(), Some("world"));
        assert!(!t.contains_key("hello"));
        assert!(t.is_empty());
    }

    #[test]
    fn upsert_overwrites_without_growing_len() {
        let mut t: HashTable<String, String> = HashTable::new();
        t.insert("hello".into(), "George".into()).unwrap();
        let prev = t.insert("hello".into(), "Steve".into()).unwrap();
        assert_eq!(prev.as_deref(), Some("George"));
        assert_eq!(t.get("hello").map(String::as_str), Some("Steve"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn growth_happens_past_three_quarters() {
        let mut t: HashTable<String, usize> = HashTable::new();
        for i in 0..24 {
            t.insert(format!("k{}", i), i).unwrap();
        }
        // 24/32 is exactly 0.75: no growth yet.
        assert_eq!(t.capacity(), 32);
        t.insert("k24".into(), 24).unwrap();
        assert!(t.capacity() >= 64);
        for i in 0..25 {
            assert_eq!(t.get(format!("k{}", i).as_str()), Some(&i));
        }
        assert_shape(&t);
    }

    #[test]
    fn thousand_keys_survive_growth() {
        let mut t: HashTable<String, String> = HashTable::new();
        for i in 0..1000 {
            t.insert(format!("key{}", i), format!("val{}", i)).unwrap();
        }
        assert_eq!(t.len(), 1000);
        assert!(t.capacity() > INITIAL_CAPACITY);
        for i in 0..1000 {
            assert_eq!(
                t.get(format!("key{}", i).as_str()).map(String::as_str),
                Some(format!("val{}", i).as_str())
            );
        }
        let keys: BTreeSet<&String> = t.keys().collect();
        assert_eq!(keys.len(), 1000);
        assert_eq!(t.iter().count(), 1000);
        assert_shape(&t);
    }

    #[test]
    fn removing_absent_key_changes_nothing() {
        let mut t: HashTable<String, i32> = HashTable::new();
        t.insert("a".into(), 1).unwrap();
        let cap = t.capacity();
        assert_eq!(t.remove("zzz"), None);
        assert_eq!(t.len(), 1);
        assert_eq!(t.capacity(), cap);
        assert_eq!(t.get("a"), Some(&1));

        let mut empty: HashTable<String, i32> = HashTable::new();
        assert_eq!(empty.remove("a"), None);
        assert_eq!(empty.capacity(), 0);
    }

    #[test]
    fn resize_rounds_up_and_never_shrinks() {
        let mut t: HashTable<String, i32> = HashTable::new();
        t.resize(3).unwrap();
        assert_eq!(t.capacity(), 4);
        t.insert("a".into(), 1).unwrap();
        let cap = t.capacity();
        t.resize(cap + 1).unwrap();
        assert_eq!(t.capacity(), cap << 1);
        t.resize(1).unwrap();
        assert_eq!(t.capacity(), cap << 1);
        assert_eq!(t.get("a"), Some(&1));
        t.resize(0).unwrap();
        assert_eq!(t.capacity(), cap << 1);
    }

    #[test]
    fn shrink_to_fit_packs_and_never_grows() {
        let mut t: HashTable<String, usize> = HashTable::new();
        t.resize(1024).unwrap();
        for i in 0..10 {
            t.insert(format!("k{}", i), i).unwrap();
        }
        t.shrink_to_fit().unwrap();
        assert!(t.capacity() >= 16 && t.capacity() < 1024);
        for i in 0..10 {
            assert_eq!(t.get(format!("k{}", i).as_str()), Some(&i));
        }
        let before = t.capacity();
        t.shrink_to_fit().unwrap();
        assert!(t.capacity() <= before);
        assert_shape(&t);
    }

    #[test]
    fn shrink_to_fit_on_empty_releases() {
        let mut t: HashTable<String, i32> = HashTable::new();
        t.insert("a".into(), 1).unwrap();
        t.remove("a");
        t.shrink_to_fit().unwrap();
        assert_eq!(t.capacity(), 0);
        t.insert("b".into(), 2).unwrap();
        assert_eq!(t.get("b"), Some(&2));
    }

    #[test]
    fn clear_resets_to_unallocated() {
        let mut t: HashTable<String, i32> = HashTable::new();
        for i in 0..100 {
            t.insert(format!("k{}", i), i).unwrap();
        }
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.capacity(), 0);
        assert!(!t.contains_key("k1"));
        t.insert("k1".into(), 7).unwrap();
        assert_eq!(t["k1"], 7);
    }

    #[test]
    fn keys_compare_full_length() {
        let mut t: HashTable<Vec<u8>, i32> = HashTable::new();
        t.insert(b"abc".to_vec(), 1).unwrap();
        t.insert(b"ab\0c".to_vec(), 2).unwrap();
        assert!(t.get(&b"ab".to_vec()).is_none());
        assert!(t.get(&b"abcd".to_vec()).is_none());
        assert_eq!(t.get(&b"abc".to_vec()), Some(&1));
        assert_eq!(t.get(&b"ab\0c".to_vec()), Some(&2));
    }

    #[test]
    fn single_home_index_forces_growth_when_walk_is_full() {
        let mut t: HashTable<String, usize, ZeroHash> = HashTable::with_hasher(ZeroHash);
        for i in 0..40 {
            t.insert(format!("k{}", i), i).unwrap();
            assert_shape(&t);
        }
        for i in 0..40 {
            assert_eq!(t.get(format!("k{}", i).as_str()), Some(&i));
        }
    }

    #[test]
    fn removal_inside_a_walk_keeps_later_keys_reachable() {
        let mut t: HashTable<String, usize, ZeroHash> = HashTable::with_hasher(ZeroHash);
        for i in 0..5 {
            t.insert(format!("k{}", i), i).unwrap();
        }
        // k0 sits at the head of every other key's walk.
        assert_eq!(t.remove("k0"), Some(0));
        for i in 1..5 {
            assert_eq!(t.get(format!("k{}", i).as_str()), Some(&i));
        }
        // Reinsert reuses a cleared slot and stays unique.
        t.insert("k3".into(), 33).unwrap();
        assert_eq!(t.len(), 4);
        assert_eq!(t.get("k3"), Some(&33));
        t.insert("k0".into(), 100).unwrap();
        assert_eq!(t.len(), 5);
        t.rehash(0).unwrap();
        assert_eq!(t.get("k0"), Some(&100));
        assert_eq!(t.get("k4"), Some(&4));
    }

    #[test]
    fn insert_unique_skips_lookup() {
        let mut t: HashTable<String, i32> = HashTable::new();
        *t.insert_unique("a".into(), 1).unwrap() += 1;
        assert_eq!(t.get("a"), Some(&2));
        for i in 0..100 {
            t.insert_unique(format!("u{}", i), i).unwrap();
        }
        assert_eq!(t.len(), 101);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn insert_unique_duplicate_panics_in_debug() {
        let mut t: HashTable<String, i32> = HashTable::new();
        t.insert("a".into(), 1).unwrap();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.insert_unique("a".into(), 2);
        }));
        assert!(res.is_err(), "expected duplicate insert_unique to panic");
    }

    #[test]
    fn try_insert_rejects_duplicates() {
        let mut t: HashTable<String, i32> = HashTable::new();
        assert_eq!(*t.try_insert("a".into(), 1).unwrap(), 1);
        match t.try_insert("a".into(), 2) {
            Err(TableError::DuplicateKey) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(t.get("a"), Some(&1));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn index_panics_on_absent_key() {
        let t: HashTable<String, i32> = HashTable::new();
        let res = std::panic::catch_unwind(|| t["missing"]);
        assert!(res.is_err());
    }

    #[test]
    fn retain_and_drain() {
        let mut t: HashTable<String, usize> = (0..50).map(|i| (format!("k{}", i), i)).collect();
        let cap = t.capacity();
        t.retain(|_, v| *v % 2 == 0);
        assert_eq!(t.len(), 25);
        assert_eq!(t.capacity(), cap);
        assert!(t.contains_key("k48"));
        assert!(!t.contains_key("k49"));

        let drained: BTreeSet<usize> = t.drain().map(|(_, v)| v).collect();
        assert_eq!(drained, (0..50).step_by(2).collect::<BTreeSet<usize>>());
        assert!(t.is_empty());
        assert_eq!(t.capacity(), 0);
    }

    #[test]
    fn equality_ignores_layout() {
        let a: HashTable<String, i32> = (0..40).map(|i| (format!("k{}", i), i)).collect();
        let mut b: HashTable<String, i32> = HashTable::new();
        b.resize(1024).unwrap();
        for i in (0..40).rev() {
            b.insert(format!("k{}", i), i).unwrap();
        }
        assert_eq!(a, b);
        b.insert("k0".into(), -1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generic_keys_with_hashed_policy() {
        let mut t: HashTable<(u32, u32), &str, Hashed> = HashTable::default();
        t.insert((1, 2), "a").unwrap();
        t.insert((2, 1), "b").unwrap();
        assert_eq!(t.get(&(1u32, 2u32)), Some(&"a"));
        assert_eq!(t.get(&(2u32, 1u32)), Some(&"b"));
        assert!(t.get(&(3u32, 3u32)).is_none());
    }

    #[test]
    fn compaction_after_a_quarter_removed() {
        let mut t: HashTable<String, usize> = HashTable::new();
        for i in 0..100 {
            t.insert(format!("k{}", i), i).unwrap();
        }
        let cap = t.capacity();
        assert_eq!(cap, 256);
        let generation = t.generation();
        for i in 0..63 {
            t.remove(format!("k{}", i).as_str());
        }
        // Removal never relays out.
        assert_eq!(t.generation(), generation);
        assert!(t.has_holes);
        // Below the threshold a new key reuses a hole in place.
        t.insert("fresh0".into(), 0).unwrap();
        assert_eq!(t.generation(), generation);
        t.remove("k63");
        assert_eq!(t.removed, cap / 4);
        t.insert("fresh1".into(), 1).unwrap();
        assert_ne!(t.generation(), generation);
        assert!(!t.has_holes);
        assert_eq!(t.removed, 0);
        assert_eq!(t.capacity(), cap);
        for i in 64..100 {
            assert_eq!(t.get(format!("k{}", i).as_str()), Some(&i));
        }
        assert_eq!(t.get("fresh0"), Some(&0));
        assert_eq!(t.get("fresh1"), Some(&1));
        assert_eq!(t.len(), 38);
    }

    #[test]
    fn overwrite_does_not_compact() {
        let mut t: HashTable<String, usize> = (0..20).map(|i| (format!("k{}", i), i)).collect();
        for i in 0..10 {
            t.remove(format!("k{}", i).as_str());
        }
        let generation = t.generation();
        t.insert("k15".into(), 150).unwrap();
        assert_eq!(t.generation(), generation);
        assert_eq!(t.get("k15"), Some(&150));
    }

    #[test]
    fn rehash_keeps_or_grows_capacity() {
        let mut t: HashTable<String, usize> = HashTable::new();
        t.rehash(0).unwrap();
        assert_eq!(t.capacity(), 0);
        for i in 0..10 {
            t.insert(format!("k{}", i), i).unwrap();
        }
        t.remove("k3");
        assert!(t.has_holes);
        t.rehash(4).unwrap();
        assert_eq!(t.capacity(), 32);
        assert!(!t.has_holes);
        t.rehash(100).unwrap();
        assert_eq!(t.capacity(), 128);
        for i in (0..10).filter(|i| *i != 3) {
            assert_eq!(t.get(format!("k{}", i).as_str()), Some(&i));
        }
        assert!(matches!(t.rehash(usize::MAX), Err(TableError::CapacityOverflow)));
        assert_eq!(t.capacity(), 128);
    }

    /// Claims more elements than it yields.
    struct Overclaiming(std::vec::IntoIter<(String, i32)>);
    impl Iterator for Overclaiming {
        type Item = (String, i32);
        fn next(&mut self) -> Option<Self::Item> {
            self.0.next()
        }
        fn size_hint(&self) -> (usize, Option<usize>) {
            (usize::MAX, None)
        }
    }

    #[test]
    fn extend_ignores_impossible_size_hint() {
        let mut t: HashTable<String, i32> = HashTable::new();
        t.insert("a".into(), 0).unwrap();
        let items = vec![("b".to_string(), 1), ("c".to_string(), 2)];
        t.extend(Overclaiming(items.into_iter()));
        assert_eq!(t.len(), 3);
        assert_eq!(t.capacity(), INITIAL_CAPACITY);
        assert_eq!(t["c"], 2);
    }

    #[test]
    fn debug_lists_entries() {
        let mut t: HashTable<String, i32> = HashTable::new();
        assert_eq!(format!("{:?}", t), "{}");
        t.insert("a".into(), 1).unwrap();
        assert_eq!(format!("{:?}", t), "{\"a\": 1}");
    }
}
