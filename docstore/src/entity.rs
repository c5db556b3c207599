//! Entity abstraction for repository record types.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record type the repository can persist.
///
/// Implementors are serde round-trippable and expose a string identifier
/// the repository may read back and overwrite.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the current identifier.
    fn id(&self) -> &str;

    /// Replaces the identifier.
    ///
    /// Called during `add` after identifier generation. Implementations
    /// that persist fields derived from the identifier, such as a
    /// partition routing field, must refresh those fields here.
    fn set_id(&mut self, id: String);
}
