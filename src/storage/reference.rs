use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::storage::error::{invalid_root_operation, StorageResult};
use crate::storage::location::Location;
use crate::storage::metadata::{ObjectMetadata, UploadMetadata};
use crate::storage::service::BlobStore;
use crate::storage::upload::{UploadProgress, UploadTask};

/// Handle on one object path of a [`BlobStore`].
#[derive(Clone)]
pub struct StorageReference {
    store: Arc<dyn BlobStore>,
    location: Location,
}

impl StorageReference {
    pub fn new(store: Arc<dyn BlobStore>, location: Location) -> Self {
        Self { store, location }
    }

    /// Reference on the root of `bucket`.
    pub fn root(store: Arc<dyn BlobStore>, bucket: impl Into<String>) -> Self {
        Self::new(store, Location::root(bucket))
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn bucket(&self) -> &str {
        self.location.bucket()
    }

    pub fn full_path(&self) -> &str {
        self.location.path()
    }

    pub fn name(&self) -> &str {
        self.location.name()
    }

    pub fn to_gs_url(&self) -> String {
        self.location.to_gs_url()
    }

    pub fn child(&self, segment: &str) -> StorageReference {
        StorageReference::new(self.store.clone(), self.location.child(segment))
    }

    fn ensure_not_root(&self, operation: &str) -> StorageResult<()> {
        if self.location.is_root() {
            Err(invalid_root_operation(operation))
        } else {
            Ok(())
        }
    }

    /// Starts a chunked upload of `data` to this reference. Nothing is sent until
    /// the task is driven.
    pub fn upload_bytes_resumable(
        &self,
        data: impl Into<Bytes>,
        metadata: Option<UploadMetadata>,
    ) -> StorageResult<UploadTask> {
        self.ensure_not_root("upload_bytes_resumable")?;
        Ok(UploadTask::new(
            self.store.clone(),
            self.location.clone(),
            data.into(),
            metadata,
        ))
    }

    /// Uploads `data` in full, notifying `progress` after every chunk.
    pub async fn upload_bytes_with_progress<F>(
        &self,
        data: impl Into<Bytes>,
        metadata: Option<UploadMetadata>,
        progress: F,
    ) -> StorageResult<ObjectMetadata>
    where
        F: FnMut(UploadProgress),
    {
        self.upload_bytes_resumable(data, metadata)?
            .run_to_completion_with_progress(progress)
            .await
    }

    pub async fn upload_bytes(
        &self,
        data: impl Into<Bytes>,
        metadata: Option<UploadMetadata>,
    ) -> StorageResult<ObjectMetadata> {
        self.upload_bytes_with_progress(data, metadata, |_| {}).await
    }

    /// Retrieves object metadata for this reference.
    ///
    /// # Errors
    ///
    /// Returns `storage/invalid-root-operation` if the reference points to the bucket root.
    pub async fn get_metadata(&self) -> StorageResult<ObjectMetadata> {
        self.ensure_not_root("get_metadata")?;
        self.store.get_metadata(&self.location).await
    }

    /// Public URL serving the object's bytes.
    pub async fn get_download_url(&self) -> StorageResult<String> {
        self.ensure_not_root("get_download_url")?;
        self.store.download_url(&self.location).await
    }

    pub async fn delete_object(&self) -> StorageResult<()> {
        self.ensure_not_root("delete_object")?;
        self.store.delete_object(&self.location).await
    }
}

impl fmt::Debug for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageReference")
            .field("location", &self.location)
            .finish()
    }
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_gs_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::error::StorageErrorCode;
    use crate::storage::memory::InMemoryBlobStore;

    fn root() -> StorageReference {
        StorageReference::root(Arc::new(InMemoryBlobStore::new()), "shop.appspot.com")
    }

    #[tokio::test]
    async fn upload_then_resolve_url() {
        let image = root().child("images").child("tea.png");
        assert_eq!(image.name(), "tea.png");
        assert_eq!(image.to_string(), "gs://shop.appspot.com/images/tea.png");

        let metadata = image
            .upload_bytes(Bytes::from_static(b"png"), None)
            .await
            .unwrap();
        assert_eq!(metadata.full_path, "images/tea.png");

        let url = image.get_download_url().await.unwrap();
        assert!(url.starts_with(
            "https://firebasestorage.googleapis.com/v0/b/shop.appspot.com/o/images%2Ftea.png?alt=media&token="
        ));

        image.delete_object().await.unwrap();
        let err = image.get_metadata().await.unwrap_err();
        assert_eq!(err.code, StorageErrorCode::ObjectNotFound);
    }

    #[tokio::test]
    async fn root_operations_are_rejected() {
        let err = root().get_download_url().await.unwrap_err();
        assert_eq!(err.code, StorageErrorCode::InvalidRootOperation);
        assert!(root().upload_bytes_resumable(Bytes::new(), None).is_err());
    }
}
