use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::application::errors::StorageError;

/// One stored row
pub type Row = Map<String, Value>;

/// RowStore trait - flat row persistence used by feature plugins
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn select_all(&self) -> Result<Vec<Row>, StorageError>;

    /// Rows whose `field` equals `value`
    async fn select_eq(&self, field: &str, value: &Value) -> Result<Vec<Row>, StorageError>;

    async fn insert(&self, row: Row) -> Result<(), StorageError>;

    /// Remove rows whose `field` equals `value`, returning how many were removed
    async fn remove_eq(&self, field: &str, value: &Value) -> Result<usize, StorageError>;
}
