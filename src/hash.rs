//! Hashing: the polynomial byte hash, Fibonacci folding, and the two
//! injected strategies (`KeyHasher`, `KeyEq`) a table is parameterized by.

use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Odd 64-bit multiplier near 2^64 / golden ratio.
pub const FIB_MULT: u64 = 11400714819323198485;

/// Base of the polynomial byte hash.
pub const HASH_PRIME: u64 = 151;

/// Polynomial hash over `bytes`: `Σ bytes[i] * 151^i` with wrapping
/// arithmetic, accumulated with a running multiplier.
#[inline]
pub fn poly151(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0;
    let mut mult: u64 = 1;
    for &b in bytes {
        hash = hash.wrapping_add(mult.wrapping_mul(b as u64));
        mult = mult.wrapping_mul(HASH_PRIME);
    }
    hash
}

/// Folds a 64-bit hash into `[0, capacity)` by Fibonacci multiplication,
/// keeping the top `log2(capacity)` bits of the product.
///
/// `capacity` must be a nonzero power of two.
#[inline]
pub fn fib_index(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two(), "capacity must be a power of two");
    let bits = capacity.trailing_zeros();
    if bits == 0 {
        return 0;
    }
    (hash.wrapping_mul(FIB_MULT) >> (64 - bits)) as usize
}

/// Hash strategy. Implementations must be pure: the same key always yields
/// the same value, and keys equal under the paired `KeyEq` hash equally.
pub trait KeyHasher<Q: ?Sized> {
    fn hash_key(&self, key: &Q) -> u64;
}

/// Key equality strategy.
pub trait KeyEq<Q: ?Sized> {
    fn key_eq(&self, stored: &Q, probe: &Q) -> bool;
}

/// Default strategy for byte-like keys (`str`, `String`, `[u8]`, `Box<[u8]>`,
/// ...): `poly151` over the key's bytes.
#[derive(Copy, Clone, Debug, Default)]
pub struct Poly151;

impl<Q> KeyHasher<Q> for Poly151
where
    Q: ?Sized + AsRef<[u8]>,
{
    #[inline]
    fn hash_key(&self, key: &Q) -> u64 {
        poly151(key.as_ref())
    }
}

/// Strategy for arbitrary `Hash` keys, delegating to a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct Hashed<S = DefaultHashBuilder>(pub S);

impl<Q, S> KeyHasher<Q> for Hashed<S>
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &Q) -> u64 {
        self.0.hash_one(key)
    }
}

/// Equality through `PartialEq`. For slices and strings this compares the
/// full length of both sides, never a prefix.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdEq;

impl<Q> KeyEq<Q> for StdEq
where
    Q: ?Sized + PartialEq,
{
    #[inline]
    fn key_eq(&self, stored: &Q, probe: &Q) -> bool {
        stored == probe
    }
}
