//! # Docstore Memory
//!
//! In-memory store client provider for the `docstore` repository, meant
//! for tests and local development.
//!
//! Collections are declared up front and created by
//! `ensure_provisioned`; documents live in process memory and are lost
//! on exit. The provider counts create attempts and provisioning runs
//! so tests can assert on repository behavior.
//!
//! ## Example
//!
//! ```rust
//! use docstore_memory::{CollectionConfig, MemoryStoreProvider};
//!
//! let provider = MemoryStoreProvider::with_collections([
//!     CollectionConfig::new("orders").partitioned_by("region"),
//! ]);
//! ```
//!
//! ## Modules
//!
//! - [`collection`] – CollectionConfig and per-collection storage
//! - [`filter`] – Where-clause evaluation for the query operation
//! - [`provider`] – MemoryStoreProvider / MemoryStoreClient

mod collection;
mod filter;
mod provider;

pub use collection::CollectionConfig;
pub use provider::{MemoryStoreClient, MemoryStoreProvider};
