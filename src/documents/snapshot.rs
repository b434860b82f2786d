use serde_json::{Map, Value};

use crate::documents::key::DocumentKey;

/// Field data stored in a document.
pub type DocumentData = Map<String, Value>;

/// Position of a document in a collection's default ordering.
///
/// Stores order documents by creation: `sequence` is assigned once when the
/// document is created and never changes, the id breaks ties. Cursors are
/// opaque to callers and only handed back to [`Query::start_after`](crate::documents::Query::start_after).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentCursor {
    sequence: u64,
    id: String,
}

impl DocumentCursor {
    pub fn new(sequence: u64, id: impl Into<String>) -> Self {
        Self {
            sequence,
            id: id.into(),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    key: DocumentKey,
    data: Option<DocumentData>,
    sequence: Option<u64>,
}

impl DocumentSnapshot {
    pub fn new(key: DocumentKey, data: DocumentData, sequence: u64) -> Self {
        Self {
            key,
            data: Some(data),
            sequence: Some(sequence),
        }
    }

    /// Snapshot for a key with no stored document.
    pub fn missing(key: DocumentKey) -> Self {
        Self {
            key,
            data: None,
            sequence: None,
        }
    }

    /// Returns whether the document exists in the store.
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&DocumentData> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<DocumentData> {
        self.data
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(field))
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn id(&self) -> &str {
        self.key.id()
    }

    /// Cursor pointing at this document, `None` when it does not exist.
    pub fn cursor(&self) -> Option<DocumentCursor> {
        self.sequence
            .map(|sequence| DocumentCursor::new(sequence, self.key.id()))
    }
}

/// The results of a query or of a collection listener, in store order.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySnapshot {
    collection: String,
    documents: Vec<DocumentSnapshot>,
    version: u64,
}

impl QuerySnapshot {
    pub fn new(collection: impl Into<String>, documents: Vec<DocumentSnapshot>) -> Self {
        Self {
            collection: collection.into(),
            documents,
            version: 0,
        }
    }

    /// Stamps the store version the snapshot was read at.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Store version at read time. A snapshot with a smaller version than one
    /// already seen reflects an older state of the collection. Zero when the
    /// store does not track versions.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Cursor of the last document, used to request the following page.
    pub fn last_cursor(&self) -> Option<DocumentCursor> {
        self.documents.last().and_then(DocumentSnapshot::cursor)
    }

    pub fn into_documents(self) -> Vec<DocumentSnapshot> {
        self.documents
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}
