//! Local cache stores.
//!
//! A [`LocalStore`] holds one denormalized row per resource identity. Rows
//! are a stale subset of server truth: they only exist so the first emission
//! of a read can be instantaneous, and they are always superseded by the
//! network emission that follows.
//!
//! Two implementations are provided:
//!
//! - [`InMemoryStore`]: a `BTreeMap` behind a `parking_lot::RwLock`
//! - [`JsonFileStore`] (feature `file-store`): the same table persisted to a
//!   single JSON file on every mutation

mod memory;

#[cfg(feature = "file-store")]
mod file;

pub use memory::InMemoryStore;

#[cfg(feature = "file-store")]
pub use file::JsonFileStore;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// =============================================================================
// CacheRow
// =============================================================================

/// A record that can be cached locally.
///
/// Every row has a stable key and belongs to exactly one owner. List reads
/// look rows up by owner; single reads by key.
pub trait CacheRow: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The stable identifier of this row.
    fn key(&self) -> &str;

    /// The identifier of the user this row is listed under.
    fn owner(&self) -> &str;
}

// =============================================================================
// StoreError
// =============================================================================

/// Errors raised by a local store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Store I/O error: {message}")]
    Io {
        /// Detailed error message.
        message: String,
    },

    /// Encoding or decoding the stored rows failed.
    #[error("Store serialization error: {message}")]
    Serialization {
        /// Detailed error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `Io` error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// LocalStore
// =============================================================================

/// Asynchronous local persistence for one resource family.
///
/// Implementations are internally synchronized; callers never add locking
/// around store calls.
pub trait LocalStore<R: CacheRow>: Send + Sync {
    /// Returns the row stored under `key`.
    fn get_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<Option<R>>>;

    /// Returns every row owned by `owner`, ordered by key.
    fn get_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<Vec<R>>>;

    /// Inserts or fully replaces each row by key.
    fn upsert_all(&self, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>>;

    /// Removes the row stored under `key`, if any.
    fn delete_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<()>>;

    /// Removes every row owned by `owner`.
    fn delete_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<()>>;

    /// Makes `rows` the complete set of rows owned by `owner`.
    ///
    /// Rows of `owner` whose key is not in `rows` are removed, the rest are
    /// upserted. The change is applied as a whole or not at all.
    fn replace_all_by_owner(&self, owner: &str, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>>;

    /// Removes every row.
    fn delete_all(&self) -> BoxFuture<'_, StoreResult<()>>;
}

impl<R, S> LocalStore<R> for Arc<S>
where
    R: CacheRow,
    S: LocalStore<R> + ?Sized,
{
    fn get_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<Option<R>>> {
        (**self).get_by_key(key)
    }

    fn get_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<Vec<R>>> {
        (**self).get_all_by_owner(owner)
    }

    fn upsert_all(&self, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>> {
        (**self).upsert_all(rows)
    }

    fn delete_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<()>> {
        (**self).delete_by_key(key)
    }

    fn delete_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<()>> {
        (**self).delete_all_by_owner(owner)
    }

    fn replace_all_by_owner(&self, owner: &str, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>> {
        (**self).replace_all_by_owner(owner, rows)
    }

    fn delete_all(&self) -> BoxFuture<'_, StoreResult<()>> {
        (**self).delete_all()
    }
}
