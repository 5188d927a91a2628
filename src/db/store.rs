use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use super::query::{Aggregation, Filter, FindQuery, IndexSpec};
use crate::model::Book;

/// Outcome of a single-document update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub matched: u64,
    pub modified: u64,
}

/// Operations the report needs from a book collection.
///
/// One implementation talks to MongoDB; tests use an in-memory one. Every call
/// is a single round trip. `close` must be called exactly once, after which the
/// store must not be used.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Establish the session, failing if the server cannot be reached
    async fn connect(&self) -> Result<()>;

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>>;

    /// Set `field` to `value` on the first document matching `filter`
    async fn set_field(&self, filter: &Filter, field: &str, value: Bson) -> Result<UpdateSummary>;

    /// Delete the first document matching `filter`, returning the deleted count
    async fn delete_one(&self, filter: &Filter) -> Result<u64>;

    async fn aggregate(&self, aggregation: Aggregation) -> Result<Vec<Document>>;

    /// Create an index, returning its name
    async fn create_index(&self, index: &IndexSpec) -> Result<String>;

    /// `executionStats` explain output for a find with `filter`
    async fn explain(&self, filter: &Filter) -> Result<Document>;

    async fn count(&self) -> Result<u64>;

    async fn drop_collection(&self) -> Result<()>;

    async fn insert_books(&self, books: &[Book]) -> Result<usize>;

    async fn close(&self) -> Result<()>;
}
