//! Durable client-side key/value storage.
//!
//! The storefront keeps two kinds of entries here: the credential token
//! ([`keys::TOKEN`](crate::models::session::keys::TOKEN)) and one serialized
//! cart per owner (`cartItems_<owner>`). Access is synchronous: a write has
//! completed by the time the call returns, so a subsequent read of the same
//! key always observes it.
//!
//! # Implementations
//!
//! - [`MemoryStorage`] - process-local map, optionally with a byte quota
//! - [`FileStorage`] - one file per key inside a directory

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors raised by a [`ClientStorage`] backend.
///
/// Cart code never propagates these; they are logged and the cart is treated
/// as empty.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The write would exceed the storage quota.
    #[error("storage quota exceeded writing {key} ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// The key cannot be stored by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Synchronous string key/value storage.
pub trait ClientStorage {
    /// Read a value. Absent keys are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write did not complete.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}
