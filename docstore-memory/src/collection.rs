//! Collection configuration and per-collection document storage.

use std::collections::HashMap;

use anyhow::anyhow;
use docstore::{Document, StoreError, StoreQuery};

use crate::filter::WherePredicate;

/// Declared shape of a collection: its name and the document field the
/// store reads partition values from, if any.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    name: String,
    partition_field: Option<String>,
}

impl CollectionConfig {
    /// Declares an unpartitioned collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_field: None,
        }
    }

    /// Sets the document field partition values are read from. The field
    /// must hold a string in every document written to the collection.
    pub fn partitioned_by(mut self, field: impl Into<String>) -> Self {
        self.partition_field = Some(field.into());
        self
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The partition field, when the collection is partitioned.
    pub fn partition_field(&self) -> Option<&str> {
        self.partition_field.as_deref()
    }
}

/// Storage key for one document: resolved partition plus identifier.
type DocumentKey = (Option<String>, String);

/// One provisioned collection and its documents.
#[derive(Debug)]
pub(crate) struct MemoryCollection {
    partition_field: Option<String>,
    documents: HashMap<DocumentKey, Document>,
}

impl MemoryCollection {
    pub(crate) fn new(partition_field: Option<String>) -> Self {
        Self {
            partition_field,
            documents: HashMap::new(),
        }
    }

    /// Stores a new document, deriving its partition from the document
    /// itself.
    pub(crate) fn create(&mut self, document: Document) -> Result<Document, StoreError> {
        let id = document_id(&document)?;
        let partition = self.partition_of(&document)?;
        let key = (partition, id);
        if self.documents.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "document '{}' already exists",
                key.1
            )));
        }
        self.documents.insert(key, document.clone());
        Ok(document)
    }

    pub(crate) fn read(
        &self,
        id: &str,
        partition_key: Option<&str>,
    ) -> Result<Document, StoreError> {
        self.documents
            .get(&key_for(id, partition_key))
            .cloned()
            .ok_or_else(|| missing(id))
    }

    /// Replaces the document stored under `id`. The replacement routes by
    /// its own partition value, so a document cannot move partitions.
    pub(crate) fn replace(&mut self, id: &str, document: Document) -> Result<Document, StoreError> {
        let body_id = document_id(&document)?;
        if body_id != id {
            return Err(StoreError::Backend(anyhow!(
                "document id '{}' does not match replace target '{}'",
                body_id,
                id
            )));
        }
        let partition = self.partition_of(&document)?;
        match self.documents.get_mut(&(partition, body_id)) {
            Some(stored) => {
                *stored = document.clone();
                Ok(document)
            }
            None => Err(missing(id)),
        }
    }

    pub(crate) fn delete(
        &mut self,
        id: &str,
        partition_key: Option<&str>,
    ) -> Result<(), StoreError> {
        self.documents
            .remove(&key_for(id, partition_key))
            .map(|_| ())
            .ok_or_else(|| missing(id))
    }

    pub(crate) fn read_all(&self) -> Vec<Document> {
        self.documents.values().cloned().collect()
    }

    pub(crate) fn query(&self, query: &StoreQuery) -> Result<Vec<Document>, StoreError> {
        let predicate = WherePredicate::parse(query)?;
        Ok(self
            .documents
            .values()
            .filter(|document| predicate.matches(document))
            .cloned()
            .collect())
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn clear(&mut self) {
        self.documents.clear();
    }

    fn partition_of(&self, document: &Document) -> Result<Option<String>, StoreError> {
        let Some(field) = self.partition_field.as_deref() else {
            return Ok(None);
        };
        match document.get(field).and_then(Document::as_str) {
            Some(value) => Ok(Some(value.to_string())),
            None => Err(StoreError::Backend(anyhow!(
                "partition field '{}' is missing or not a string",
                field
            ))),
        }
    }
}

fn key_for(id: &str, partition_key: Option<&str>) -> DocumentKey {
    (partition_key.map(str::to_string), id.to_string())
}

fn document_id(document: &Document) -> Result<String, StoreError> {
    document
        .get("id")
        .and_then(Document::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Backend(anyhow!("document has no string 'id' field")))
}

fn missing(id: &str) -> StoreError {
    StoreError::NotFound(format!("document '{}'", id))
}
