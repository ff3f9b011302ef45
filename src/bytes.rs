//! Byte-string table: owned copies of arbitrary byte keys and values.
//!
//! Lengths travel with the slices, so keys and values may contain NUL bytes.
//! Copies are allocated fallibly before the table is touched; an allocation
//! failure leaves the table as it was.

use crate::error::{try_vec, TableError};
use crate::table::HashTable;
use core::fmt;

fn copy_bytes(bytes: &[u8]) -> Result<Box<[u8]>, TableError> {
    let mut v = try_vec::<u8>(bytes.len())?;
    v.extend_from_slice(bytes);
    Ok(v.into_boxed_slice())
}

/// Table of byte-string keys to byte-string values, hashed with `poly151`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteTable {
    inner: HashTable<Box<[u8]>, Box<[u8]>>,
}

impl ByteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.contains_key(key)
    }

    pub fn resize(&mut self, min_capacity: usize) -> Result<(), TableError> {
        self.inner.resize(min_capacity)
    }

    pub fn shrink_to_fit(&mut self) -> Result<(), TableError> {
        self.inner.shrink_to_fit()
    }

    /// Store copies of `key` and `value`, replacing the value of a present
    /// key.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), TableError> {
        let value = copy_bytes(value)?;
        if let Some(slot) = self.inner.get_mut(key) {
            *slot = value;
            return Ok(());
        }
        let key = copy_bytes(key)?;
        self.inner.insert_unique(key, value)?;
        Ok(())
    }

    /// Store copies of a key the caller guarantees is absent.
    pub fn insert_unique(&mut self, key: &[u8], value: &[u8]) -> Result<(), TableError> {
        let key = copy_bytes(key)?;
        let value = copy_bytes(value)?;
        self.inner.insert_unique(key, value)?;
        Ok(())
    }

    pub fn search(&self, key: &[u8]) -> Option<&[u8]> {
        self.inner.get(key).map(|v| &**v)
    }

    /// Remove `key`; false if it was absent.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.inner.remove(key).is_some()
    }

    /// Remove `key` and hand its value back to the caller.
    pub fn remove_and_return(&mut self, key: &[u8]) -> Option<Box<[u8]>> {
        self.inner.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.inner.iter().map(|(k, v)| (&**k, &**v))
    }

    pub fn to_json(&self, escape: bool) -> Result<Vec<u8>, TableError> {
        self.inner.to_json_bytes(escape)
    }
}

impl fmt::Debug for ByteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.iter()
                    .map(|(k, v)| (String::from_utf8_lossy(k), String::from_utf8_lossy(v))),
            )
            .finish()
    }
}
