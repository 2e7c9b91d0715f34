//! Listing results returned by the collection and document stores.
//!
//! Both carry the total number of entries alongside the returned items, so a
//! caller paging through a collection knows when it has reached the end.

use serde::{Deserialize, Serialize};

use crate::{collection::Collection, document::Document, query::DocumentQuery};

/// All collections in the store, ordered by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CollectionList {
    /// Number of collections in the store.
    pub total: usize,
    /// The collections, in ascending lexicographic name order.
    pub collections: Vec<Collection>,
}

impl CollectionList {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { total: collections.len(), collections }
    }
}

/// One page of a collection's documents, newest first.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DocumentList {
    /// Total count of documents in the collection, regardless of the window.
    pub total: usize,
    /// Offset the page starts at.
    pub offset: usize,
    /// Maximum page size that was requested.
    pub limit: usize,
    /// The documents in this page.
    pub documents: Vec<Document>,
}

impl DocumentList {
    /// Builds a page for `query` out of the documents fetched for it.
    pub fn new(total: usize, query: &DocumentQuery, documents: Vec<Document>) -> Self {
        Self {
            total,
            offset: query.offset,
            limit: query.limit,
            documents,
        }
    }

    /// Returns `true` if documents exist beyond this page.
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.documents.len()) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_list_total_matches_entries() {
        let list = CollectionList::new(vec![Collection::new("a"), Collection::new("b")]);

        assert_eq!(list.total, 2);
    }

    #[test]
    fn document_list_reports_remaining_pages() {
        let query = DocumentQuery::builder().limit(100).offset(0).build();
        let page = DocumentList::new(150, &query, Vec::new());

        assert_eq!(page.limit, 100);
        assert!(page.has_more());

        let last = DocumentList::new(0, &DocumentQuery::default(), Vec::new());
        assert!(!last.has_more());
    }
}
