//! fib-hashtable: an open-addressing hash map with Fibonacci hashing,
//! quadratic probing and tombstone-free removal.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, predictable hash table whose layout rules fit in a few
//!   sentences, with every fallible allocation reported instead of aborting.
//! - Layers:
//!   - `hash`: the `poly151` byte hash, `fib_index` folding and the
//!     `KeyHasher`/`KeyEq` strategies a table is parameterized by.
//!   - `HashTable<K, V, H, E>`: the slot array, probing, growth and
//!     relayout. `Entry` and the iterators borrow it.
//!   - `ByteTable`: owned byte-string keys and values on top of
//!     `HashTable`, plus the JSON debug dump.
//!
//! Constraints
//! - Single-threaded; no interior mutability, no atomics.
//! - Capacity is 0 or a power of two. The first insert allocates
//!   `INITIAL_CAPACITY` slots; the table doubles before the load factor
//!   would pass 0.75, and also when a key's probe walk finds no free slot.
//! - Each slot keeps its key's 64-bit hash. Relayout folds the stored hash
//!   again and never calls back into the hasher.
//! - Keys are unique. `insert_unique` trusts the caller (checked in debug
//!   builds); `entry` and `try_insert` prove absence with a lookup.
//!
//! Probing
//! - Home index is `fib_index(hash, capacity)`; step `n` of the walk visits
//!   `home + n^2` modulo capacity.
//! - The table remembers the longest walk any placement took since the last
//!   relayout (`max_probe`). Lookups never walk further than that.
//! - Removal clears the slot in place. While cleared slots may sit inside
//!   another key's walk, lookups skip over empty slots rather than stopping
//!   at them; the next relayout (or emptying the table) restores the
//!   stop-at-empty fast path.
//!
//! Failure semantics
//! - Operations that allocate return `Result<_, TableError>` and leave the
//!   table unchanged on error. Relayout plans the whole new layout before
//!   allocating the new array, so no entry moves until success is certain.
//! - A missing key is `None`/`false`, never an error.
//!
//! Notes and non-goals
//! - No thread safety, persistence or iteration-order guarantees.
//! - Borrowing iterators and references returned by lookups hold the table
//!   borrow. `Cursor` is the detached form and panics if the table was
//!   reallocated under it.

mod bytes;
mod entry;
mod error;
pub mod hash;
mod iter;
mod json;
mod table;
mod table_proptest;

// Public surface
pub use bytes::ByteTable;
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::TableError;
pub use hash::{Hashed, KeyEq, KeyHasher, Poly151, StdEq};
pub use iter::{Cursor, Drain, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use table::{HashTable, INITIAL_CAPACITY};
