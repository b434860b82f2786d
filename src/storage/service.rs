use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::error::StorageResult;
use crate::storage::location::Location;
use crate::storage::metadata::{ObjectMetadata, UploadMetadata};

/// Resumable upload session opened by [`BlobStore::start_upload`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSession {
    id: String,
    location: Location,
    total_bytes: u64,
}

impl UploadSession {
    pub fn new(id: impl Into<String>, location: Location, total_bytes: u64) -> Self {
        Self {
            id: id.into(),
            location,
            total_bytes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

/// Server view of a session after a chunk was accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadStatus {
    pub current: u64,
    pub total: u64,
    pub finalized: bool,
    pub metadata: Option<ObjectMetadata>,
}

impl UploadStatus {
    pub fn new(current: u64, total: u64, finalized: bool, metadata: Option<ObjectMetadata>) -> Self {
        Self {
            current,
            total,
            finalized,
            metadata,
        }
    }
}

/// Blob storage backend holding binary objects by name.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    async fn start_upload(
        &self,
        location: &Location,
        total_bytes: u64,
        metadata: Option<UploadMetadata>,
    ) -> StorageResult<UploadSession>;

    /// Appends `chunk` at `offset`. The object becomes visible once a chunk with
    /// `finalize` set completes the declared size.
    async fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        chunk: Bytes,
        finalize: bool,
    ) -> StorageResult<UploadStatus>;

    async fn get_metadata(&self, location: &Location) -> StorageResult<ObjectMetadata>;

    async fn download_url(&self, location: &Location) -> StorageResult<String>;

    async fn delete_object(&self, location: &Location) -> StorageResult<()>;
}
