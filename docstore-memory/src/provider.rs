//! In-memory store provider.
//!
//! Collections declared up front are created when `ensure_provisioned`
//! runs; until then every operation against them reports not-found,
//! which is what drives the repository's create retry. The provider
//! counts create attempts and provisioning runs so tests can assert on
//! repository behavior.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use docstore::{Document, StoreClient, StoreClientProvider, StoreError, StoreQuery};
use log::info;
use tokio::sync::RwLock;
use tracing::debug;

use crate::collection::{CollectionConfig, MemoryCollection};

#[derive(Debug, Default)]
struct ProviderState {
    declared: Vec<CollectionConfig>,
    collections: HashMap<String, MemoryCollection>,
    create_attempts: HashMap<String, u64>,
    ensure_calls: u64,
}

impl ProviderState {
    fn collection(&self, name: &str) -> Result<&MemoryCollection, StoreError> {
        self.collections.get(name).ok_or_else(|| not_provisioned(name))
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut MemoryCollection, StoreError> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| not_provisioned(name))
    }
}

fn not_provisioned(name: &str) -> StoreError {
    StoreError::NotFound(format!("collection '{}' is not provisioned", name))
}

/// In-memory document store for tests and local development. Documents
/// live in the process and are lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreProvider {
    state: Arc<RwLock<ProviderState>>,
}

impl MemoryStoreProvider {
    /// Creates a provider with no declared collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that declares `collections` for provisioning.
    pub fn with_collections(collections: impl IntoIterator<Item = CollectionConfig>) -> Self {
        let state = ProviderState {
            declared: collections.into_iter().collect(),
            ..ProviderState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// True once `collection` has been provisioned.
    pub async fn is_provisioned(&self, collection: &str) -> bool {
        self.state.read().await.collections.contains_key(collection)
    }

    /// Number of documents stored in `collection`; zero when it is not
    /// provisioned.
    pub async fn len(&self, collection: &str) -> usize {
        let state = self.state.read().await;
        state
            .collections
            .get(collection)
            .map(MemoryCollection::len)
            .unwrap_or(0)
    }

    /// Number of create calls received for `collection`, counting ones
    /// rejected because the collection was not provisioned.
    pub async fn create_attempts(&self, collection: &str) -> u64 {
        let state = self.state.read().await;
        state.create_attempts.get(collection).copied().unwrap_or(0)
    }

    /// Number of times `ensure_provisioned` has run.
    pub async fn ensure_calls(&self) -> u64 {
        self.state.read().await.ensure_calls
    }

    /// Removes every document from every provisioned collection. The
    /// collections themselves stay provisioned.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        for collection in state.collections.values_mut() {
            collection.clear();
        }
    }
}

#[async_trait]
impl StoreClientProvider for MemoryStoreProvider {
    type Client = MemoryStoreClient;

    fn client(&self, collection: &str) -> MemoryStoreClient {
        MemoryStoreClient {
            collection: collection.to_string(),
            state: Arc::clone(&self.state),
        }
    }

    async fn ensure_provisioned(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.ensure_calls += 1;

        let ProviderState {
            declared,
            collections,
            ..
        } = &mut *state;
        for config in declared.iter() {
            if !collections.contains_key(config.name()) {
                info!("Provisioning collection: {}", config.name());
                collections.insert(
                    config.name().to_string(),
                    MemoryCollection::new(config.partition_field().map(str::to_string)),
                );
            }
        }

        Ok(())
    }
}

/// Client handle bound to one collection of a [`MemoryStoreProvider`].
#[derive(Debug, Clone)]
pub struct MemoryStoreClient {
    collection: String,
    state: Arc<RwLock<ProviderState>>,
}

#[async_trait]
impl StoreClient for MemoryStoreClient {
    async fn read(&self, id: &str, partition_key: Option<&str>) -> Result<Document, StoreError> {
        let state = self.state.read().await;
        let result = state.collection(&self.collection)?.read(id, partition_key);
        debug!(
            collection = %self.collection,
            id,
            found = result.is_ok(),
            "Memory store read"
        );
        result
    }

    async fn create(&self, document: Document) -> Result<Document, StoreError> {
        let mut state = self.state.write().await;
        *state
            .create_attempts
            .entry(self.collection.clone())
            .or_insert(0) += 1;
        debug!(collection = %self.collection, "Memory store create");
        state.collection_mut(&self.collection)?.create(document)
    }

    async fn replace(&self, id: &str, document: Document) -> Result<Document, StoreError> {
        let mut state = self.state.write().await;
        debug!(collection = %self.collection, id, "Memory store replace");
        state.collection_mut(&self.collection)?.replace(id, document)
    }

    async fn delete(&self, id: &str, partition_key: Option<&str>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        debug!(collection = %self.collection, id, "Memory store delete");
        state
            .collection_mut(&self.collection)?
            .delete(id, partition_key)
    }

    async fn read_all(&self) -> Result<Vec<Document>, StoreError> {
        let state = self.state.read().await;
        Ok(state.collection(&self.collection)?.read_all())
    }

    async fn query(&self, query: &StoreQuery) -> Result<Vec<Document>, StoreError> {
        let state = self.state.read().await;
        let matches = state.collection(&self.collection)?.query(query)?;
        debug!(
            collection = %self.collection,
            clause = query.where_clause(),
            count = matches.len(),
            "Memory store query"
        );
        Ok(matches)
    }
}
