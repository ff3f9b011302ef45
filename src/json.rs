//! JSON debug dump: one object holding every key/value as strings, in
//! iteration order.
//!
//! The buffer is sized once from the unescaped length and doubles when the
//! escaped form outgrows it. Allocation failure drops the partial buffer
//! and reports `TableError::AllocFailed`; a successful dump is never empty
//! (at least `{}`).

use crate::error::{try_vec, TableError};
use crate::table::HashTable;
use log::warn;

/// Exact length of the unescaped dump.
fn plain_len<'a, I>(pairs: I) -> Option<usize>
where
    I: Iterator<Item = (&'a [u8], &'a [u8])>,
{
    // `{` and `}`, then `"k":"v"` plus a separating comma per pair.
    let mut len: usize = 2;
    let mut count: usize = 0;
    for (k, v) in pairs {
        len = len.checked_add(k.len())?.checked_add(v.len())?.checked_add(5)?;
        count += 1;
    }
    Some(len + count.saturating_sub(1))
}

struct JsonBuf {
    buf: Vec<u8>,
}

impl JsonBuf {
    fn with_capacity(estimate: usize) -> Result<Self, TableError> {
        Ok(Self {
            buf: try_vec(estimate)?,
        })
    }

    /// Make room for `extra` more bytes, at least doubling the buffer when
    /// it has to grow.
    fn reserve(&mut self, extra: usize) -> Result<(), TableError> {
        let needed = self
            .buf
            .len()
            .checked_add(extra)
            .ok_or(TableError::CapacityOverflow)?;
        if needed <= self.buf.capacity() {
            return Ok(());
        }
        let target = needed.max(self.buf.capacity().saturating_mul(2));
        self.buf
            .try_reserve_exact(target - self.buf.len())
            .map_err(|_| {
                warn!("json buffer growth to {} bytes failed", target);
                TableError::AllocFailed { bytes: target }
            })
    }

    fn push(&mut self, bytes: &[u8]) -> Result<(), TableError> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Quoted string; with `escape`, `"` and `\` get a backslash and control
    /// bytes become `\u00XX`.
    fn push_str(&mut self, bytes: &[u8], escape: bool) -> Result<(), TableError> {
        self.push(b"\"")?;
        if !escape {
            self.push(bytes)?;
            return self.push(b"\"");
        }
        let mut run = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let escaped: Option<[u8; 6]> = match b {
                b'"' | b'\\' => Some([b'\\', b, 0, 0, 0, 0]),
                0x00..=0x1f => {
                    const HEX: &[u8; 16] = b"0123456789abcdef";
                    Some([b'\\', b'u', b'0', b'0', HEX[(b >> 4) as usize], HEX[(b & 0xf) as usize]])
                }
                _ => None,
            };
            if let Some(seq) = escaped {
                self.push(&bytes[run..i])?;
                let n = if seq[1] == b'u' { 6 } else { 2 };
                self.push(&seq[..n])?;
                run = i + 1;
            }
        }
        self.push(&bytes[run..])?;
        self.push(b"\"")
    }
}

/// Serialize `pairs` as a JSON object.
pub(crate) fn stringify<'a, I>(pairs: I, escape: bool) -> Result<Vec<u8>, TableError>
where
    I: Iterator<Item = (&'a [u8], &'a [u8])> + Clone,
{
    let estimate = plain_len(pairs.clone()).ok_or(TableError::CapacityOverflow)?;
    let mut out = JsonBuf::with_capacity(estimate)?;
    out.push(b"{")?;
    for (i, (k, v)) in pairs.enumerate() {
        if i > 0 {
            out.push(b",")?;
        }
        out.push_str(k, escape)?;
        out.push(b":")?;
        out.push_str(v, escape)?;
    }
    out.push(b"}")?;
    Ok(out.buf)
}

impl<K, V, H, E> HashTable<K, V, H, E>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    /// JSON object of all entries. Without `escape` the caller asserts no
    /// key or value needs escaping; with it, the output is always valid JSON.
    pub fn to_json(&self, escape: bool) -> Result<String, TableError> {
        let pairs = self
            .iter()
            .map(|(k, v)| (k.as_ref().as_bytes(), v.as_ref().as_bytes()));
        let bytes = stringify(pairs, escape)?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl<K, V, H, E> HashTable<K, V, H, E>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    /// Byte form of [`HashTable::to_json`] for keys/values that need not be
    /// UTF-8.
    pub fn to_json_bytes(&self, escape: bool) -> Result<Vec<u8>, TableError> {
        stringify(self.iter().map(|(k, v)| (k.as_ref(), v.as_ref())), escape)
    }
}
