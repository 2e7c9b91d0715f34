//! Pagination parameters for listing the documents of a collection.
//!
//! A [`DocumentQuery`] is transient: it is never persisted and only governs which
//! window of a collection [`Documents::list`](crate::document::Documents::list)
//! returns. Documents are always ordered by creation time, newest first.
//!
//! ```ignore
//! use flexstore::query::DocumentQuery;
//!
//! let query = DocumentQuery::builder()
//!     .limit(25)
//!     .offset(50)
//!     .build();
//! ```
//!
//! The builder only overrides a default when the supplied value is usable: a limit
//! must be greater than zero and an offset must not be negative. Anything else
//! silently keeps the default, so raw request parameters can be passed straight in.

use serde::{Deserialize, Serialize};

/// Number of documents returned when no limit is given.
pub const DEFAULT_LIMIT: usize = 100;

/// Number of documents skipped when no offset is given.
pub const DEFAULT_OFFSET: usize = 0;

/// Pagination window over a collection's documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentQuery {
    /// Maximum number of documents to return.
    pub limit: usize,
    /// Number of documents to skip.
    pub offset: usize,
    /// Accepted for compatibility with clients that send it; not evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Accepted for compatibility with clients that send it; not evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl DocumentQuery {
    /// Creates a query with the default window (first 100 documents).
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
            filter: None,
            sort: None,
        }
    }

    /// Creates a new query builder.
    pub fn builder() -> DocumentQueryBuilder {
        DocumentQueryBuilder::new()
    }
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct DocumentQueryBuilder {
    query: DocumentQuery,
}

impl DocumentQueryBuilder {
    /// Creates a new builder holding the default query.
    pub fn new() -> Self {
        DocumentQueryBuilder { query: DocumentQuery::default() }
    }

    /// Sets the maximum number of documents to return.
    ///
    /// Values of zero or below leave the default in place.
    pub fn limit(mut self, limit: i64) -> Self {
        if limit > 0 {
            self.query.limit = usize::try_from(limit).unwrap_or(usize::MAX);
        }
        self
    }

    /// Sets the number of documents to skip.
    ///
    /// Negative values leave the default in place.
    pub fn offset(mut self, offset: i64) -> Self {
        if offset >= 0 {
            self.query.offset = usize::try_from(offset).unwrap_or(usize::MAX);
        }
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.query.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.query.sort = Some(sort.into());
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> DocumentQuery {
        self.query
    }
}

impl Default for DocumentQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_hundred() {
        let query = DocumentQuery::default();

        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 0);
        assert!(query.filter.is_none());
        assert!(query.sort.is_none());
    }

    #[test]
    fn positive_limit_and_non_negative_offset_override() {
        let query = DocumentQuery::builder().limit(10).offset(0).build();
        assert_eq!((query.limit, query.offset), (10, 0));

        let query = DocumentQuery::builder().limit(1).offset(250).build();
        assert_eq!((query.limit, query.offset), (1, 250));
    }

    #[test]
    fn unusable_values_keep_defaults() {
        let query = DocumentQuery::builder().limit(0).offset(-1).build();
        assert_eq!((query.limit, query.offset), (DEFAULT_LIMIT, DEFAULT_OFFSET));

        let query = DocumentQuery::builder().limit(-20).build();
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn filter_and_sort_are_carried_but_inert() {
        let query = DocumentQuery::builder()
            .filter("age>30")
            .sort("-name")
            .build();

        assert_eq!(query.filter.as_deref(), Some("age>30"));
        assert_eq!(query.sort.as_deref(), Some("-name"));
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }
}
