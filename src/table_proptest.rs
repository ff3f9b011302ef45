#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check
// slot-level invariants through crate-private accessors.

use crate::hash::{KeyHasher, Poly151, StdEq};
use crate::table::HashTable;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertUnique(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Shrink,
    Resize(usize),
    Rehash(usize),
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=48).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertUnique(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Shrink),
            1 => (0usize..300).prop_map(OpI::Resize),
            1 => (0usize..300).prop_map(OpI::Rehash),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn check_shape<H>(sut: &HashTable<Key, i32, H, StdEq>) -> Result<(), TestCaseError> {
    let cap = sut.capacity();
    prop_assert!(cap == 0 || cap.is_power_of_two(), "capacity {} not a power of two", cap);
    prop_assert!(sut.len() <= cap);
    prop_assert_eq!(sut.raw_slots().iter().flatten().count(), sut.len());
    Ok(())
}

// Drives one scenario against std::collections::HashMap as the model.
fn run<H>(mut sut: HashTable<Key, i32, H, StdEq>, pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    H: KeyHasher<Key> + KeyHasher<str>,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.insert(k.clone(), v).expect("insert allocates");
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::InsertUnique(i, v) => {
                let k = key_from(pool, i);
                if model.contains_key(&k) {
                    // Duplicates go through the checked form instead.
                    prop_assert!(sut.try_insert(k.clone(), v).is_err());
                } else {
                    let slot = sut.insert_unique(k.clone(), v).expect("insert allocates");
                    prop_assert_eq!(*slot, v);
                    model.insert(k, v);
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
                prop_assert!(!sut.contains_key(k.0.as_str()));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(k.0.as_str()), model.get(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(vr) = sut.get_mut(k.0.as_str()) {
                    *vr = vr.saturating_add(d);
                    let mv = model.get_mut(&k).expect("present in model");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().count(), model.len());
            }
            OpI::Shrink => {
                let before = sut.capacity();
                sut.shrink_to_fit().expect("shrink allocates");
                prop_assert!(sut.capacity() <= before, "shrink_to_fit must not grow");
                if !sut.is_empty() && sut.capacity() < before {
                    prop_assert!(sut.capacity() >= sut.len().next_power_of_two());
                }
            }
            OpI::Resize(n) => {
                let before = sut.capacity();
                sut.resize(n).expect("resize allocates");
                prop_assert!(sut.capacity() >= before, "resize must not shrink");
                prop_assert!(sut.capacity() >= n);
            }
            OpI::Rehash(n) => {
                let before = sut.capacity();
                sut.rehash(n).expect("rehash allocates");
                prop_assert!(sut.capacity() >= before);
                prop_assert!(sut.capacity() >= n);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        check_shape(&sut)?;
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k.0.as_str()), Some(v));
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` returns the previous value exactly when the model had one.
// - `get`/`contains_key` parity through borrowed `&str` lookups.
// - `remove` returns the model's value and the key is gone afterwards.
// - Capacity stays 0 or a power of two and every entry sits in one slot.
// - `shrink_to_fit` never grows; `resize` never shrinks.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(HashTable::with_hasher(Poly151), &pool, ops)?;
    }
}

// Every key hashes to 0, so all keys share one probe walk and growth is
// driven by walk exhaustion rather than load.
#[derive(Clone, Copy, Default)]
struct ZeroHash;
impl<Q: ?Sized> KeyHasher<Q> for ZeroHash {
    fn hash_key(&self, _key: &Q) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior. This stresses equality probing and removals in the
// middle of a shared walk.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(HashTable::with_hasher(ZeroHash), &pool, ops)?;
    }
}
