use std::cmp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::storage::constants::{MAX_RESUMABLE_CHUNK_SIZE, RESUMABLE_UPLOAD_CHUNK_SIZE};
use crate::storage::error::{canceled, internal_error, StorageError, StorageResult};
use crate::storage::location::Location;
use crate::storage::metadata::{ObjectMetadata, UploadMetadata};
use crate::storage::service::{BlobStore, UploadSession};

/// Represents the execution state of an [`UploadTask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadTaskState {
    Pending,
    Running,
    Completed,
    Error,
    Canceled,
}

/// Progress information emitted after every accepted chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn new(bytes_transferred: u64, total_bytes: u64) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
        }
    }

    /// Completed fraction in `0.0..=1.0`; an empty upload counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.bytes_transferred as f64 / self.total_bytes as f64
        }
    }
}

/// Cancels an [`UploadTask`] from outside the future driving it.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Chunked, resumable transfer of one payload into a [`BlobStore`].
///
/// The task opens a session on the first chunk, then sends chunks starting at
/// 256 KiB. Each accepted chunk doubles the next one up to 32 MiB; a rejected
/// chunk resets the size and leaves the task in [`UploadTaskState::Error`]
/// until it is driven again.
/// Drive it chunk by chunk with [`upload_next`](Self::upload_next) or all at once
/// with [`run_to_completion`](Self::run_to_completion).
pub struct UploadTask {
    store: Arc<dyn BlobStore>,
    location: Location,
    data: Bytes,
    metadata: Option<UploadMetadata>,
    total_bytes: u64,
    transferred: u64,
    session: Option<UploadSession>,
    state: UploadTaskState,
    last_error: Option<StorageError>,
    result_metadata: Option<ObjectMetadata>,
    chunk_multiplier: usize,
    cancel: CancelHandle,
}

impl UploadTask {
    pub fn new(
        store: Arc<dyn BlobStore>,
        location: Location,
        data: Bytes,
        metadata: Option<UploadMetadata>,
    ) -> Self {
        let total_bytes = data.len() as u64;
        Self {
            store,
            location,
            data,
            metadata,
            total_bytes,
            transferred: 0,
            session: None,
            state: UploadTaskState::Pending,
            last_error: None,
            result_metadata: None,
            chunk_multiplier: 1,
            cancel: CancelHandle::default(),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.transferred
    }

    pub fn state(&self) -> UploadTaskState {
        if self.cancel.is_canceled()
            && matches!(self.state, UploadTaskState::Pending | UploadTaskState::Running)
        {
            return UploadTaskState::Canceled;
        }
        self.state
    }

    pub fn last_error(&self) -> Option<&StorageError> {
        self.last_error.as_ref()
    }

    /// Resulting object metadata after a successful upload.
    pub fn metadata(&self) -> Option<&ObjectMetadata> {
        self.result_metadata.as_ref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stops the task before its next chunk. A completed task stays completed.
    pub fn cancel(&mut self) {
        if matches!(self.state, UploadTaskState::Pending | UploadTaskState::Running) {
            self.cancel.cancel();
            self.state = UploadTaskState::Canceled;
        }
    }

    /// Size of the chunk the next call to [`upload_next`](Self::upload_next) sends.
    pub fn current_chunk_size(&self) -> usize {
        cmp::min(
            RESUMABLE_UPLOAD_CHUNK_SIZE * self.chunk_multiplier,
            MAX_RESUMABLE_CHUNK_SIZE,
        )
    }

    /// Uploads the next chunk and invokes the provided progress callback.
    ///
    /// Returns `Ok(Some(metadata))` once the final chunk was accepted. After an
    /// error the next call resends from the last accepted offset.
    pub async fn upload_next_with_progress<F>(
        &mut self,
        mut progress: F,
    ) -> StorageResult<Option<ObjectMetadata>>
    where
        F: FnMut(UploadProgress),
    {
        match self.state() {
            UploadTaskState::Completed => return Ok(self.result_metadata.clone()),
            UploadTaskState::Canceled => {
                self.state = UploadTaskState::Canceled;
                return Err(canceled());
            }
            _ => {}
        }

        self.state = UploadTaskState::Running;
        let session = match self.session.clone() {
            Some(session) => session,
            None => {
                let opened = self
                    .store
                    .start_upload(&self.location, self.total_bytes, self.metadata.clone())
                    .await;
                match opened {
                    Ok(session) => {
                        self.session = Some(session.clone());
                        session
                    }
                    Err(err) => return self.fail(err),
                }
            }
        };

        let start_offset = self.transferred;
        let end_offset = cmp::min(
            self.total_bytes,
            start_offset + self.current_chunk_size() as u64,
        );
        let finalize = end_offset == self.total_bytes;
        let chunk = self.data.slice(start_offset as usize..end_offset as usize);

        let uploaded = self
            .store
            .upload_chunk(&session, start_offset, chunk, finalize)
            .await;
        let status = match uploaded {
            Ok(status) => status,
            Err(err) => {
                self.reset_multiplier();
                return self.fail(err);
            }
        };

        self.transferred = status.current;
        self.last_error = None;
        progress(UploadProgress::new(self.transferred, self.total_bytes));

        if status.finalized {
            let Some(metadata) = status.metadata else {
                return self.fail(internal_error("upload completed without metadata"));
            };
            self.state = UploadTaskState::Completed;
            self.result_metadata = Some(metadata.clone());
            Ok(Some(metadata))
        } else {
            self.bump_multiplier();
            Ok(None)
        }
    }

    pub async fn upload_next(&mut self) -> StorageResult<Option<ObjectMetadata>> {
        self.upload_next_with_progress(|_| {}).await
    }

    /// Runs the task to completion while notifying `progress` for each chunk.
    pub async fn run_to_completion_with_progress<F>(
        mut self,
        mut progress: F,
    ) -> StorageResult<ObjectMetadata>
    where
        F: FnMut(UploadProgress),
    {
        loop {
            if let Some(metadata) = self.upload_next_with_progress(&mut progress).await? {
                return Ok(metadata);
            }
        }
    }

    pub async fn run_to_completion(self) -> StorageResult<ObjectMetadata> {
        self.run_to_completion_with_progress(|_| {}).await
    }

    fn bump_multiplier(&mut self) {
        let next = self.chunk_multiplier * 2;
        if next * RESUMABLE_UPLOAD_CHUNK_SIZE <= MAX_RESUMABLE_CHUNK_SIZE {
            self.chunk_multiplier = next;
        }
    }

    fn reset_multiplier(&mut self) {
        self.chunk_multiplier = 1;
    }

    fn fail<T>(&mut self, error: StorageError) -> StorageResult<T> {
        self.state = UploadTaskState::Error;
        self.last_error = Some(error.clone());
        Err(error)
    }
}
