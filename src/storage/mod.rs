//! Blob storage: object locations, chunked uploads and public download URLs.
//!
//! [`BlobStore`] is the backend seam; [`InMemoryBlobStore`] keeps objects in
//! process memory. [`StorageReference`] addresses one object path and drives
//! [`UploadTask`]s against the store it was created from.
mod constants;
mod error;
mod location;
mod memory;
mod metadata;
mod reference;
mod service;
mod upload;

#[doc(inline)]
pub use constants::{DEFAULT_HOST, MAX_RESUMABLE_CHUNK_SIZE, RESUMABLE_UPLOAD_CHUNK_SIZE};

#[doc(inline)]
pub use error::{
    canceled, internal_error, invalid_argument, invalid_root_operation, no_download_url,
    object_not_found, unavailable, unknown_error, StorageError, StorageErrorCode, StorageResult,
};

#[doc(inline)]
pub use location::Location;

#[doc(inline)]
pub use memory::InMemoryBlobStore;

#[doc(inline)]
pub use metadata::{ObjectMetadata, UploadMetadata};

#[doc(inline)]
pub use reference::StorageReference;

#[doc(inline)]
pub use service::{BlobStore, UploadSession, UploadStatus};

#[doc(inline)]
pub use upload::{CancelHandle, UploadProgress, UploadTask, UploadTaskState};
