//! Generic typed repository over a partitioned document store.
//!
//! [`DocumentRepository`] owns the mapping between an entity type and the
//! documents of one collection: identifier generation, partition-key
//! resolution, serde conversion and store error translation. All I/O goes
//! through the injected [`StoreClientProvider`].

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{RepositoryError, Result, StoreError};
use crate::provider::{Document, StoreClient, StoreClientProvider};
use crate::query::{QueryParameters, StoreQuery};

/// Upper bound on create calls per [`DocumentRepository::add`]: the
/// initial attempt plus one retry after provisioning.
pub const MAX_CREATE_ATTEMPTS: u32 = 2;

type IdGenerator<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
type PartitionKeyResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Typed access to one collection of a document store.
///
/// Generic over the entity type `T` and the store client provider `P`.
/// Construction is cheap; clones share the provider and strategies, so a
/// repository can be handed to each component that needs the collection.
pub struct DocumentRepository<T, P> {
    provider: Arc<P>,
    collection: String,
    id_generator: IdGenerator<T>,
    partition_key: PartitionKeyResolver,
}

impl<T, P> Clone for DocumentRepository<T, P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            collection: self.collection.clone(),
            id_generator: Arc::clone(&self.id_generator),
            partition_key: Arc::clone(&self.partition_key),
        }
    }
}

impl<T, P> DocumentRepository<T, P>
where
    T: Entity,
    P: StoreClientProvider,
{
    /// Creates a repository over `collection` with the default strategies:
    /// random UUID v4 identifiers and no partition key.
    pub fn new(provider: Arc<P>, collection: impl Into<String>) -> Self {
        Self {
            provider,
            collection: collection.into(),
            id_generator: Arc::new(|_| Uuid::new_v4().to_string()),
            partition_key: Arc::new(|_| None),
        }
    }

    /// Replaces the identifier generation strategy, for example to derive
    /// deterministic identifiers from entity content.
    pub fn with_id_generator(
        mut self,
        generator: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        self.id_generator = Arc::new(generator);
        self
    }

    /// Replaces the partition-key resolution strategy.
    ///
    /// The resolver must map the same identifier to the same key on every
    /// call, and to the partition value stored inside the documents it is
    /// meant to find; reads and deletes by id silently miss documents
    /// written under any other key.
    pub fn with_partition_key(
        mut self,
        resolver: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.partition_key = Arc::new(resolver);
        self
    }

    /// The collection this repository operates on.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Resolves the partition key for `id` using the configured strategy.
    pub fn resolve_partition_key(&self, id: &str) -> Option<String> {
        (self.partition_key)(id)
    }

    /// Fetches the entity stored under `id`.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get_by_id(&self, id: &str) -> Result<T> {
        let partition_key = self.resolve_partition_key(id);
        let client = self.provider.client(&self.collection);

        debug!(partition_key = ?partition_key, "Reading document");
        match client.read(id, partition_key.as_deref()).await {
            Ok(document) => self.from_document(document),
            Err(StoreError::NotFound(_)) => Err(self.not_found(Some(id))),
            Err(err) => Err(RepositoryError::Store(err)),
        }
    }

    /// Stores a new entity and returns it as the store persisted it.
    ///
    /// The identifier on `entity` is ignored and replaced with a generated
    /// one. When the store reports its collection missing, provisioning is
    /// run once and the create is retried; a second miss is surfaced as a
    /// store error.
    #[instrument(skip(self, entity), fields(collection = %self.collection))]
    pub async fn add(&self, mut entity: T) -> Result<T> {
        let id = (self.id_generator)(&entity);
        entity.set_id(id.clone());
        let document = self.to_document(&entity)?;
        let client = self.provider.client(&self.collection);

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(id = %id, attempt, "Creating document");
            match client.create(document.clone()).await {
                Ok(stored) => {
                    info!(id = %id, attempt, "Document created");
                    return self.from_document(stored);
                }
                Err(StoreError::Conflict(_)) => {
                    return Err(RepositoryError::AlreadyExists(format!(
                        "document '{}' in '{}'",
                        id, self.collection
                    )));
                }
                Err(StoreError::NotFound(reason)) if attempt < MAX_CREATE_ATTEMPTS => {
                    warn!(
                        reason = %reason,
                        "Create reported a missing collection, provisioning and retrying"
                    );
                    self.provider
                        .ensure_provisioned()
                        .await
                        .map_err(RepositoryError::Store)?;
                }
                Err(err) => return Err(RepositoryError::Store(err)),
            }
        }
    }

    /// Replaces the stored document for `entity` under its current
    /// identifier and returns the entity as the store persisted it.
    #[instrument(skip(self, entity), fields(collection = %self.collection))]
    pub async fn update(&self, entity: &T) -> Result<T> {
        let id = entity.id();
        let document = self.to_document(entity)?;
        let client = self.provider.client(&self.collection);

        debug!(id = %id, "Replacing document");
        match client.replace(id, document).await {
            Ok(stored) => self.from_document(stored),
            Err(StoreError::NotFound(_)) => Err(self.not_found(Some(id))),
            Err(err) => Err(RepositoryError::Store(err)),
        }
    }

    /// Deletes the stored document for `entity` under its current
    /// identifier.
    #[instrument(skip(self, entity), fields(collection = %self.collection))]
    pub async fn delete(&self, entity: &T) -> Result<()> {
        let id = entity.id();
        let partition_key = self.resolve_partition_key(id);
        let client = self.provider.client(&self.collection);

        debug!(id = %id, partition_key = ?partition_key, "Deleting document");
        match client.delete(id, partition_key.as_deref()).await {
            Ok(()) => {
                info!(id = %id, "Document deleted");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(self.not_found(Some(id))),
            Err(err) => Err(RepositoryError::Store(err)),
        }
    }

    /// Reads every entity in the collection, in store-native order.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get_all(&self) -> Result<Vec<T>> {
        let client = self.provider.client(&self.collection);

        match client.read_all().await {
            Ok(documents) => {
                debug!(count = documents.len(), "Read all documents");
                self.from_documents(documents)
            }
            Err(StoreError::NotFound(_)) => Err(self.not_found(None)),
            Err(err) => Err(RepositoryError::Store(err)),
        }
    }

    /// Runs a filtered read and returns the matching entities.
    ///
    /// `source` is the alias `where_clause` uses for the collection; the
    /// clause is written in the store's own dialect, with `@name`
    /// placeholders supplied by `parameters`, and passes through to the
    /// store uninterpreted.
    #[instrument(skip(self, parameters), fields(collection = %self.collection))]
    pub async fn query(
        &self,
        source: &str,
        where_clause: &str,
        parameters: QueryParameters,
    ) -> Result<Vec<T>> {
        let client = self.provider.client(&self.collection);
        let query = StoreQuery::new(source, where_clause, parameters);

        match client.query(&query).await {
            Ok(documents) => {
                debug!(count = documents.len(), "Query matched documents");
                self.from_documents(documents)
            }
            Err(StoreError::NotFound(_)) => Err(self.not_found(None)),
            Err(err) => Err(RepositoryError::Store(err)),
        }
    }

    fn to_document(&self, entity: &T) -> Result<Document> {
        Ok(serde_json::to_value(entity)?)
    }

    fn from_document(&self, document: Document) -> Result<T> {
        Ok(serde_json::from_value(document)?)
    }

    fn from_documents(&self, documents: Vec<Document>) -> Result<Vec<T>> {
        documents
            .into_iter()
            .map(|document| self.from_document(document))
            .collect()
    }

    fn not_found(&self, id: Option<&str>) -> RepositoryError {
        match id {
            Some(id) => RepositoryError::NotFound(format!(
                "document '{}' in '{}'",
                id, self.collection
            )),
            None => RepositoryError::NotFound(format!("collection '{}'", self.collection)),
        }
    }
}
