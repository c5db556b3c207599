//! Store client provider interface.
//!
//! The repository consumes a document store exclusively through these
//! traits. Transport, authentication and provisioning mechanics belong
//! to the implementing backend.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::query::StoreQuery;

/// A schemaless document as exchanged with the store: a JSON value
/// keyed by field name.
pub type Document = serde_json::Value;

/// Operations a store exposes on one collection.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Point-reads the document stored under `id` and the given
    /// partition key.
    async fn read(&self, id: &str, partition_key: Option<&str>)
        -> Result<Document, StoreError>;

    /// Creates a document. The store derives routing from the document's
    /// own fields. Reports [`StoreError::Conflict`] when the identifier
    /// is taken and [`StoreError::NotFound`] when the collection is not
    /// provisioned.
    async fn create(&self, document: Document) -> Result<Document, StoreError>;

    /// Replaces the document stored under `id` with `document`.
    async fn replace(&self, id: &str, document: Document)
        -> Result<Document, StoreError>;

    /// Deletes the document stored under `id` and the given partition key.
    async fn delete(&self, id: &str, partition_key: Option<&str>)
        -> Result<(), StoreError>;

    /// Reads every document in the collection, in store-native order.
    async fn read_all(&self) -> Result<Vec<Document>, StoreError>;

    /// Runs a filtered read. The where-clause is interpreted by the
    /// store's own dialect.
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Document>, StoreError>;
}

/// Hands out collection-bound store clients and provisions missing
/// collections.
#[async_trait]
pub trait StoreClientProvider: Send + Sync {
    /// The collection-bound client type this provider hands out.
    type Client: StoreClient;

    /// Returns a client bound to `collection`. Must be cheap and free of
    /// I/O; the repository calls it once per operation.
    fn client(&self, collection: &str) -> Self::Client;

    /// Brings every collection the provider knows about into existence.
    /// Idempotent; may be slow while backend infrastructure is created.
    async fn ensure_provisioned(&self) -> Result<(), StoreError>;
}
