use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use futures::future::BoxFuture;
use parking_lot::RwLock;

use super::{CacheRow, LocalStore, StoreResult};

// =============================================================================
// Table
// =============================================================================

/// Rows keyed by [`CacheRow::key`]. Shared by every store implementation.
#[derive(Debug, Clone)]
pub(super) struct Table<R> {
    rows: BTreeMap<String, R>,
}

impl<R: CacheRow> Table<R> {
    pub(super) const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    pub(super) fn from_rows(rows: Vec<R>) -> Self {
        let mut table = Self::new();
        table.upsert_all(rows);
        table
    }

    pub(super) fn rows(&self) -> Vec<R> {
        self.rows.values().cloned().collect()
    }

    pub(super) fn get_by_key(&self, key: &str) -> Option<R> {
        self.rows.get(key).cloned()
    }

    pub(super) fn get_all_by_owner(&self, owner: &str) -> Vec<R> {
        self.rows
            .values()
            .filter(|row| row.owner() == owner)
            .cloned()
            .collect()
    }

    pub(super) fn upsert_all(&mut self, rows: Vec<R>) {
        for row in rows {
            self.rows.insert(row.key().to_owned(), row);
        }
    }

    pub(super) fn delete_by_key(&mut self, key: &str) -> bool {
        self.rows.remove(key).is_some()
    }

    pub(super) fn delete_all_by_owner(&mut self, owner: &str) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, row| row.owner() != owner);
        before - self.rows.len()
    }

    /// Makes `rows` the complete set of rows owned by `owner`.
    pub(super) fn replace_all_by_owner(&mut self, owner: &str, rows: Vec<R>) -> usize {
        let incoming: BTreeSet<String> = rows.iter().map(|row| row.key().to_owned()).collect();
        let before = self.rows.len();
        self.rows.retain(|key, row| row.owner() != owner || incoming.contains(key));
        let removed = before - self.rows.len();
        self.upsert_all(rows);
        removed
    }

    pub(super) fn delete_all(&mut self) {
        self.rows.clear();
    }
}

// =============================================================================
// InMemoryStore
// =============================================================================

/// A process-local store with no persistence.
///
/// # Examples
///
/// ```rust
/// use quizzical::model::QuizListing;
/// use quizzical::store::{InMemoryStore, LocalStore};
///
/// # tokio_test_block_on(async {
/// let store = InMemoryStore::with_rows(vec![QuizListing::new("q1", "alice", "Cached")]);
/// let row = store.get_by_key("q1").await.unwrap();
/// assert_eq!(row.map(|quiz| quiz.title), Some("Cached".to_string()));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
/// # }
/// ```
pub struct InMemoryStore<R> {
    table: RwLock<Table<R>>,
}

impl<R: CacheRow> InMemoryStore<R> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::new()),
        }
    }

    /// Creates a store pre-populated with `rows`.
    #[must_use]
    pub fn with_rows(rows: Vec<R>) -> Self {
        Self {
            table: RwLock::new(Table::from_rows(rows)),
        }
    }

    /// Returns every stored row, ordered by key.
    #[must_use]
    pub fn rows(&self) -> Vec<R> {
        self.table.read().rows()
    }

    /// Returns the number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    /// Returns `true` when the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().rows.is_empty()
    }
}

impl<R: CacheRow> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for InMemoryStore<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InMemoryStore")
            .field("rows", &self.table.read().rows.len())
            .finish()
    }
}

impl<R: CacheRow> LocalStore<R> for InMemoryStore<R> {
    fn get_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<Option<R>>> {
        let row = self.table.read().get_by_key(key);
        Box::pin(async move { Ok(row) })
    }

    fn get_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<Vec<R>>> {
        let rows = self.table.read().get_all_by_owner(owner);
        Box::pin(async move { Ok(rows) })
    }

    fn upsert_all(&self, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.table.write().upsert_all(rows);
            Ok(())
        })
    }

    fn delete_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<()>> {
        let key = key.to_owned();
        Box::pin(async move {
            self.table.write().delete_by_key(&key);
            Ok(())
        })
    }

    fn delete_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<()>> {
        let owner = owner.to_owned();
        Box::pin(async move {
            self.table.write().delete_all_by_owner(&owner);
            Ok(())
        })
    }

    fn replace_all_by_owner(&self, owner: &str, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>> {
        let owner = owner.to_owned();
        Box::pin(async move {
            self.table.write().replace_all_by_owner(&owner, rows);
            Ok(())
        })
    }

    fn delete_all(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.table.write().delete_all();
            Ok(())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
