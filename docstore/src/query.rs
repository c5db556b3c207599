//! Filtered-query inputs passed through to the store.

use crate::provider::Document;

/// Named parameters bound into a where-clause, kept in bind order.
///
/// Parameter names are matched verbatim against the placeholders in the
/// clause, sigil included: bind `"@min_score"` for a clause written as
/// `p.score >= @min_score`.
#[derive(Debug, Clone, Default)]
pub struct QueryParameters {
    parameters: Vec<(String, Document)>,
}

impl QueryParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` under `name`, returning the set for chaining.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Document>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Looks up the first value bound under `name`.
    pub fn get(&self, name: &str) -> Option<&Document> {
        self.parameters
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Iterates bound pairs in bind order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// True when nothing has been bound.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// A filtered read as handed to the store: the alias the clause uses for
/// the collection, the where-clause in the store's dialect, and the
/// parameters bound into it.
#[derive(Debug, Clone)]
pub struct StoreQuery {
    source: String,
    where_clause: String,
    parameters: QueryParameters,
}

impl StoreQuery {
    /// Assembles a query for the store to interpret.
    pub fn new(
        source: impl Into<String>,
        where_clause: impl Into<String>,
        parameters: QueryParameters,
    ) -> Self {
        Self {
            source: source.into(),
            where_clause: where_clause.into(),
            parameters,
        }
    }

    /// The alias the where-clause uses for the collection.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The filter text, uninterpreted by the repository.
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// The parameters bound into the clause.
    pub fn parameters(&self) -> &QueryParameters {
        &self.parameters
    }
}
