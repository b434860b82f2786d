use std::fmt;
use std::sync::{Arc, LazyLock};

use bytes::Bytes;

use crate::logger::Logger;
use crate::storage::{
    invalid_argument, BlobStore, StorageReference, StorageResult, UploadMetadata, UploadProgress,
};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@storefront/images"));

/// A local image picked in the editor, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    bytes: Bytes,
    content_type: Option<String>,
}

impl ImageFile {
    /// The content type is guessed from the file extension; override it with
    /// [`with_content_type`](Self::with_content_type).
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(&name).map(str::to_string);
        Self {
            name,
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

fn guess_content_type(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Pushes editor images to blob storage and resolves their public URLs.
///
/// Objects are stored under the file's own name, beneath an optional prefix.
/// Uploading two files with the same name overwrites the first object.
#[derive(Clone, Debug)]
pub struct ImageUploader {
    root: StorageReference,
}

impl ImageUploader {
    pub fn new(store: Arc<dyn BlobStore>, bucket: impl Into<String>, prefix: &str) -> Self {
        Self {
            root: StorageReference::root(store, bucket).child(prefix),
        }
    }

    pub fn reference_for(&self, file: &ImageFile) -> StorageResult<StorageReference> {
        if file.name().trim().is_empty() {
            return Err(invalid_argument("Image file name must not be empty."));
        }
        Ok(self.root.child(file.name()))
    }

    /// Uploads `file` and returns its download URL. No retry is attempted.
    pub async fn upload(&self, file: &ImageFile) -> StorageResult<String> {
        self.upload_with_progress(file, |_| {}).await
    }

    pub async fn upload_with_progress<F>(&self, file: &ImageFile, progress: F) -> StorageResult<String>
    where
        F: FnMut(UploadProgress),
    {
        let reference = self.reference_for(file)?;
        let metadata = file
            .content_type()
            .map(|content_type| UploadMetadata::new().with_content_type(content_type));

        let result = async {
            reference
                .upload_bytes_with_progress(file.bytes().clone(), metadata, progress)
                .await?;
            reference.get_download_url().await
        }
        .await;

        match &result {
            Ok(_) => LOGGER.info(format!(
                "uploaded image {} ({} bytes)",
                reference,
                file.len()
            )),
            Err(err) => LOGGER.warn(format!("image upload to {reference} failed: {err}")),
        }
        result
    }
}
