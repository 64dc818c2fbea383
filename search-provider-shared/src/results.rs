//! Query result types.

use serde::{Deserialize, Serialize};

use crate::Document;

/// Documents matching a query plus the total match count.
///
/// `documents` holds at most the requested number of rows, in the engine's
/// relevance order. `num_found` counts every match, not just the returned page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub documents: Vec<Document>,
    pub num_found: u64,
    pub max_score: Option<f32>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The first (highest ranked) document.
    pub fn first(&self) -> Option<&Document> {
        self.documents.first()
    }

    /// Identifiers of the returned documents, in rank order.
    pub fn ids(&self) -> Vec<String> {
        self.documents.iter().filter_map(Document::id).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}
