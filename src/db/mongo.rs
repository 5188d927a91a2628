//! `BookStore` backed by the official MongoDB driver.
use anyhow::{Context, Result};
use async_trait::async_trait;
use derive_builder::Builder;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

use super::query::{
    Aggregation, Filter, FindQuery, IndexSpec, explain_command, set_document,
};
use super::store::{BookStore, UpdateSummary};
use crate::config::{APP_NAME, CONNECT_TIMEOUT, SERVER_SELECTION_TIMEOUT};
use crate::model::Book;

#[derive(Builder)]
pub struct StoreArgs {
    #[builder(setter(into))]
    uri: String,
    #[builder(setter(into))]
    database: String,
    #[builder(setter(into))]
    collection: String,
    #[builder(default = "CONNECT_TIMEOUT")]
    connect_timeout: Duration,
    #[builder(default = "SERVER_SELECTION_TIMEOUT")]
    server_selection_timeout: Duration,
}

/// A client plus the database and collection handles it owns for one run
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
    books: Collection<Document>,
    collection_name: String,
}

/// Build a client for `args`. No server round trip happens until
/// [`BookStore::connect`] is called.
pub async fn store(args: StoreArgs) -> Result<MongoStore> {
    let StoreArgs {
        uri,
        database,
        collection,
        connect_timeout,
        server_selection_timeout,
    } = args;

    let mut options = ClientOptions::parse(&uri)
        .await
        .with_context(|| format!("Invalid connection URI '{}'", uri))?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(connect_timeout);
    options.server_selection_timeout = Some(server_selection_timeout);

    let client = Client::with_options(options).context("Failed to create MongoDB client")?;
    let database = client.database(&database);
    let books = database.collection::<Document>(&collection);

    Ok(MongoStore {
        client,
        database,
        books,
        collection_name: collection,
    })
}

#[async_trait]
impl BookStore for MongoStore {
    async fn connect(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .with_context(|| format!("Failed to connect to database '{}'", self.database.name()))?;
        tracing::info!(database = self.database.name(), collection = %self.collection_name, "connected");
        Ok(())
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>> {
        let cursor = self
            .books
            .find(query.filter.to_document())
            .with_options(query.find_options())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_field(&self, filter: &Filter, field: &str, value: Bson) -> Result<UpdateSummary> {
        let result = self
            .books
            .update_one(filter.to_document(), set_document(field, value))
            .await?;
        Ok(UpdateSummary {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64> {
        let result = self.books.delete_one(filter.to_document()).await?;
        Ok(result.deleted_count)
    }

    async fn aggregate(&self, aggregation: Aggregation) -> Result<Vec<Document>> {
        let cursor = self.books.aggregate(aggregation.pipeline()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_index(&self, index: &IndexSpec) -> Result<String> {
        let model = IndexModel::builder().keys(index.keys_document()).build();
        let result = self.books.create_index(model).await?;
        Ok(result.index_name)
    }

    async fn explain(&self, filter: &Filter) -> Result<Document> {
        let command = explain_command(&self.collection_name, filter);
        Ok(self.database.run_command(command).await?)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.books.count_documents(doc! {}).await?)
    }

    async fn drop_collection(&self) -> Result<()> {
        self.books.drop().await?;
        Ok(())
    }

    async fn insert_books(&self, books: &[Book]) -> Result<usize> {
        if books.is_empty() {
            return Ok(0);
        }
        let result = self
            .database
            .collection::<Book>(&self.collection_name)
            .insert_many(books)
            .await?;
        Ok(result.inserted_ids.len())
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!("shutting down client");
        self.client.clone().shutdown().await;
        Ok(())
    }
}
