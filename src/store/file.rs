use std::fmt;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use super::memory::Table;
use super::{CacheRow, LocalStore, StoreError, StoreResult};

/// A store that persists its whole table to one JSON file.
///
/// Every mutation is applied to a copy of the table, written to a sibling
/// temporary file and renamed over the target. The in-memory table only
/// changes once the rename succeeds, so a failed write leaves both the file
/// and the store untouched.
pub struct JsonFileStore<R> {
    path: PathBuf,
    table: Mutex<Table<R>>,
}

impl<R> fmt::Debug for JsonFileStore<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<R: CacheRow> JsonFileStore<R> {
    /// Opens the store at `path`, loading existing rows if the file exists.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file or its directory cannot be
    /// accessed and [`StoreError::Serialization`] if the file is not a JSON
    /// array of rows.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| StoreError::io(format!("{}: {error}", parent.display())))?;
        }

        let table = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let rows: Vec<R> = serde_json::from_slice(&bytes).map_err(|error| {
                    StoreError::serialization(format!("{}: {error}", path.display()))
                })?;
                tracing::debug!(path = %path.display(), rows = rows.len(), "Loaded cache file");
                Table::from_rows(rows)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Table::new(),
            Err(error) => {
                return Err(StoreError::io(format!("{}: {error}", path.display())));
            }
        };

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<F>(&self, change: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Table<R>) + Send,
    {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        change(&mut next);
        self.persist(&next).await?;
        *table = next;
        Ok(())
    }

    async fn persist(&self, table: &Table<R>) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&table.rows())
            .map_err(|error| StoreError::serialization(error.to_string()))?;

        let mut temporary = self.path.clone().into_os_string();
        temporary.push(".tmp");
        let temporary = PathBuf::from(temporary);

        tokio::fs::write(&temporary, bytes)
            .await
            .map_err(|error| StoreError::io(format!("{}: {error}", temporary.display())))?;
        tokio::fs::rename(&temporary, &self.path)
            .await
            .map_err(|error| StoreError::io(format!("{}: {error}", self.path.display())))
    }
}

impl<R: CacheRow> LocalStore<R> for JsonFileStore<R> {
    fn get_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<Option<R>>> {
        let key = key.to_owned();
        Box::pin(async move { Ok(self.table.lock().await.get_by_key(&key)) })
    }

    fn get_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<Vec<R>>> {
        let owner = owner.to_owned();
        Box::pin(async move { Ok(self.table.lock().await.get_all_by_owner(&owner)) })
    }

    fn upsert_all(&self, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(self.mutate(move |table| table.upsert_all(rows)))
    }

    fn delete_by_key(&self, key: &str) -> BoxFuture<'_, StoreResult<()>> {
        let key = key.to_owned();
        Box::pin(self.mutate(move |table| {
            table.delete_by_key(&key);
        }))
    }

    fn delete_all_by_owner(&self, owner: &str) -> BoxFuture<'_, StoreResult<()>> {
        let owner = owner.to_owned();
        Box::pin(self.mutate(move |table| {
            let removed = table.delete_all_by_owner(&owner);
            tracing::debug!(owner = %owner, removed, "Purged cached rows for owner");
        }))
    }

    fn replace_all_by_owner(&self, owner: &str, rows: Vec<R>) -> BoxFuture<'_, StoreResult<()>> {
        let owner = owner.to_owned();
        Box::pin(self.mutate(move |table| {
            let removed = table.replace_all_by_owner(&owner, rows);
            tracing::debug!(owner = %owner, removed, "Replaced cached rows for owner");
        }))
    }

    fn delete_all(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(self.mutate(Table::delete_all))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuizListing;
    use rstest::rstest;

    fn temporary_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("quizzical-{}", uuid::Uuid::new_v4()))
            .join("quizzes.json")
    }

    #[rstest]
    #[tokio::test]
    async fn open_missing_file_starts_empty() {
        let store = JsonFileStore::<QuizListing>::open(temporary_path())
            .await
            .unwrap();

        assert!(store.get_all_by_owner("alice").await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn rows_survive_reopen() {
        let path = temporary_path();
        {
            let store = JsonFileStore::<QuizListing>::open(&path).await.unwrap();
            store
                .upsert_all(vec![
                    QuizListing::new("q1", "alice", "Capitals"),
                    QuizListing::new("q2", "bob", "Rivers"),
                ])
                .await
                .unwrap();
            store.delete_all_by_owner("bob").await.unwrap();
        }

        let reopened = JsonFileStore::<QuizListing>::open(&path).await.unwrap();
        assert_eq!(
            reopened.get_by_key("q1").await.unwrap().map(|quiz| quiz.title),
            Some("Capitals".to_string())
        );
        assert_eq!(reopened.get_by_key("q2").await.unwrap(), None);

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }

    #[rstest]
    #[tokio::test]
    async fn open_rejects_corrupt_file() {
        let path = temporary_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"not json").await.unwrap();

        let result = JsonFileStore::<QuizListing>::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization { .. })));

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }
}
