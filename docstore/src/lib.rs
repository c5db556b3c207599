//! Docstore crate: typed repository access to a schemaless document store.
//!
//! ## Modules
//!
//! - [`error`] – Store and repository error types
//! - [`entity`] – Entity trait for persistable record types
//! - [`provider`] – StoreClient / StoreClientProvider interface
//! - [`query`] – StoreQuery and QueryParameters
//! - [`repository`] – DocumentRepository

mod entity;
mod error;
mod provider;
mod query;
mod repository;


pub use entity::Entity;
pub use error::{RepositoryError, Result, StoreError};
pub use provider::{Document, StoreClient, StoreClientProvider};
pub use query::{QueryParameters, StoreQuery};
pub use repository::{DocumentRepository, MAX_CREATE_ATTEMPTS};
