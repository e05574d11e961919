//! Database layer (hosted document store).

pub mod appwrite;
pub mod database;
pub mod memory;
pub mod query;

pub use appwrite::AppwriteDb;
pub use database::Database;
pub use memory::MemoryDb;
pub use query::Query;

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata field names the backend adds to every document.
pub mod fields {
    pub const ID: &str = "$id";
    pub const CREATED_AT: &str = "$createdAt";
    pub const UPDATED_AT: &str = "$updatedAt";
}

/// Page of raw documents returned by a list call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub documents: Vec<Value>,
}

/// Collection-oriented document store.
///
/// Implemented by the hosted backend ([`AppwriteDb`]) and by an in-process
/// store ([`MemoryDb`]).
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// List documents matching all `queries`.
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, AppError>;

    /// Fetch one document by ID.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Create a document with a backend-assigned ID.
    async fn create_document(&self, collection: &str, data: Value) -> Result<Value, AppError>;

    /// Merge `data` into an existing document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, AppError>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), AppError>;
}

/// A typed document together with its backend metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stored<T> {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: DeserializeOwned> Stored<T> {
    /// Decode a raw document.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Database(format!("Malformed document: {}", e)))
    }
}

impl<T> std::ops::Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}
