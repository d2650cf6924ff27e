//! File-based storage implementation

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::traits::{Row, RowStore};

/// JSON file-backed row collection.
///
/// Rows live in memory; every mutation rewrites the whole file as a JSON array.
pub struct JsonRowStore {
    path: PathBuf,
    rows: Arc<RwLock<Vec<Row>>>,
}

impl JsonRowStore {
    /// Open the store at `path`, starting empty if the file does not exist yet
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let rows = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            rows: Arc::new(RwLock::new(rows)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, rows: &[Row]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(rows)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

fn field_equals(row: &Row, field: &str, value: &Value) -> bool {
    row.get(field) == Some(value)
}

#[async_trait]
impl RowStore for JsonRowStore {
    async fn select_all(&self) -> Result<Vec<Row>, StorageError> {
        Ok(self.rows.read().await.clone())
    }

    async fn select_eq(&self, field: &str, value: &Value) -> Result<Vec<Row>, StorageError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| field_equals(row, field, value))
            .cloned()
            .collect())
    }

    async fn insert(&self, row: Row) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        let mut next = rows.clone();
        next.push(row);
        self.persist(&next).await?;
        *rows = next;
        Ok(())
    }

    async fn remove_eq(&self, field: &str, value: &Value) -> Result<usize, StorageError> {
        let mut rows = self.rows.write().await;
        let next: Vec<Row> = rows
            .iter()
            .filter(|row| !field_equals(row, field, value))
            .cloned()
            .collect();
        let removed = rows.len() - next.len();
        if removed > 0 {
            self.persist(&next).await?;
            *rows = next;
        }
        Ok(removed)
    }
}
