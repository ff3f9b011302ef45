//! Error type shared by every fallible table operation.
//!
//! A missing key is never an error: lookups and removals report absence
//! through `Option`/`bool`. Errors are reserved for operations that could
//! not complete, and every operation returning one leaves the table exactly
//! as it was before the call.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    /// The allocator refused a slot array, key/value copy or output buffer.
    #[error("allocation failed: requested {bytes} bytes")]
    AllocFailed { bytes: usize },

    /// The requested capacity does not fit in `usize` or in a slot array.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// `try_insert` found the key already present.
    #[error("key already present")]
    DuplicateKey,

    /// JSON output assembled from string keys/values was not UTF-8.
    #[error("json output is not valid UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

impl TableError {
    pub(crate) fn alloc<T>(count: usize) -> Self {
        match count.checked_mul(core::mem::size_of::<T>()) {
            Some(bytes) => TableError::AllocFailed { bytes },
            None => TableError::CapacityOverflow,
        }
    }
}

/// `Vec::with_capacity` that reports allocator refusal instead of aborting.
pub(crate) fn try_vec<T>(capacity: usize) -> Result<Vec<T>, TableError> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity).map_err(|_| {
        log::warn!(
            "allocation of {} x {} bytes failed",
            capacity,
            core::mem::size_of::<T>()
        );
        TableError::alloc::<T>(capacity)
    })?;
    Ok(v)
}
