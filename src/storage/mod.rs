//! Durable client storage port.
//!
//! DESIGN
//! ======
//! The session record must survive restarts, but the gateway should not care
//! where it lives. `KeyValueStore` mirrors the browser `localStorage` surface
//! (string keys, string values, synchronous) so the gateway can be tested with
//! [`MemoryStore`] and run against [`FileStore`] in the CLI.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;

/// String key/value storage that outlives the process.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
