use std::fmt::{Display, Formatter};

use crate::documents::error::{invalid_argument, DocumentResult};

/// Location of a single document: a top-level collection plus a document id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentKey {
    collection: String,
    id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> DocumentResult<Self> {
        let collection = collection.into();
        let id = id.into();
        validate_segment(&collection, "Collection id")?;
        validate_segment(&id, "Document id")?;
        Ok(Self { collection, id })
    }

    /// Parses a `collection/id` path.
    pub fn from_path(path: &str) -> DocumentResult<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.contains("//") {
            return Err(invalid_argument("Found empty segment in document path"));
        }
        let mut segments = trimmed.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(collection), Some(id), None) => Self::new(collection, id),
            _ => Err(invalid_argument(format!(
                "Document paths must have exactly two segments, got \"{path}\""
            ))),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn canonical_string(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Checks that `collection` can name a top-level collection.
pub fn validate_collection_id(collection: &str) -> DocumentResult<()> {
    validate_segment(collection, "Collection id")
}

fn validate_segment(segment: &str, what: &str) -> DocumentResult<()> {
    if segment.trim().is_empty() {
        return Err(invalid_argument(format!("{what} must not be empty")));
    }
    if segment.contains('/') {
        return Err(invalid_argument(format!(
            "{what} \"{segment}\" must not contain '/'"
        )));
    }
    Ok(())
}
