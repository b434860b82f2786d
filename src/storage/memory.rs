use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::logger::Logger;
use crate::storage::constants::DEFAULT_HOST;
use crate::storage::error::{
    invalid_argument, invalid_root_operation, no_download_url, object_not_found, StorageResult,
};
use crate::storage::location::Location;
use crate::storage::metadata::{content_hash, format_timestamp, ObjectMetadata, UploadMetadata};
use crate::storage::service::{BlobStore, UploadSession, UploadStatus};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@storefront/storage"));

const SESSION_ID_LENGTH: usize = 24;

/// Blob store keeping objects and open upload sessions in process memory.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    host: Arc<str>,
    state: Arc<Mutex<BlobState>>,
}

#[derive(Default)]
struct BlobState {
    sessions: HashMap<String, PendingUpload>,
    objects: BTreeMap<Location, StoredObject>,
}

struct PendingUpload {
    location: Location,
    total_bytes: u64,
    buffer: BytesMut,
    metadata: Option<UploadMetadata>,
}

struct StoredObject {
    data: Bytes,
    metadata: ObjectMetadata,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::with_host(DEFAULT_HOST)
    }

    /// Store whose download URLs point at `host` instead of the default storage host.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: Arc::from(host.into()),
            state: Arc::new(Mutex::new(BlobState::default())),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    pub fn open_session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    pub fn object_bytes(&self, location: &Location) -> Option<Bytes> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(location)
            .map(|object| object.data.clone())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn start_upload(
        &self,
        location: &Location,
        total_bytes: u64,
        metadata: Option<UploadMetadata>,
    ) -> StorageResult<UploadSession> {
        if location.is_root() {
            return Err(invalid_root_operation("upload"));
        }
        let id = generate_id(SESSION_ID_LENGTH);
        let capacity = usize::try_from(total_bytes)
            .map_err(|_| invalid_argument(format!("Upload of {total_bytes} bytes is too large.")))?;
        self.state.lock().unwrap().sessions.insert(
            id.clone(),
            PendingUpload {
                location: location.clone(),
                total_bytes,
                buffer: BytesMut::with_capacity(capacity),
                metadata,
            },
        );
        LOGGER.debug(format!(
            "opened upload session for {} ({total_bytes} bytes)",
            location.to_gs_url()
        ));
        Ok(UploadSession::new(id, location.clone(), total_bytes))
    }

    async fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        chunk: Bytes,
        finalize: bool,
    ) -> StorageResult<UploadStatus> {
        let mut state = self.state.lock().unwrap();
        let pending = state
            .sessions
            .get_mut(session.id())
            .ok_or_else(|| invalid_argument(format!("Unknown upload session '{}'.", session.id())))?;

        let current = pending.buffer.len() as u64;
        if offset != current {
            return Err(invalid_argument(format!(
                "Chunk offset {offset} does not match the {current} bytes already received."
            )));
        }
        let received = current + chunk.len() as u64;
        if received > pending.total_bytes {
            return Err(invalid_argument(format!(
                "Upload exceeds the declared size of {} bytes.",
                pending.total_bytes
            )));
        }
        if finalize && received != pending.total_bytes {
            return Err(invalid_argument(format!(
                "Upload finalized after {received} of {} bytes.",
                pending.total_bytes
            )));
        }
        pending.buffer.extend_from_slice(&chunk);

        if !finalize {
            return Ok(UploadStatus::new(received, pending.total_bytes, false, None));
        }

        let Some(pending) = state.sessions.remove(session.id()) else {
            return Err(invalid_argument(format!(
                "Unknown upload session '{}'.",
                session.id()
            )));
        };
        let data = pending.buffer.freeze();
        let location = pending.location;
        let upload_metadata = pending.metadata.unwrap_or_default();
        let metadata = ObjectMetadata {
            bucket: location.bucket().to_string(),
            name: location.name().to_string(),
            full_path: location.path().to_string(),
            size: data.len() as u64,
            time_created: Some(format_timestamp(Utc::now())),
            content_type: upload_metadata.content_type,
            content_hash: Some(content_hash(&data)),
            custom_metadata: upload_metadata.custom_metadata,
            download_tokens: Some(generate_download_token()),
        };
        state.objects.insert(
            location.clone(),
            StoredObject {
                data,
                metadata: metadata.clone(),
            },
        );
        drop(state);

        LOGGER.info(format!(
            "stored {} ({} bytes)",
            location.to_gs_url(),
            metadata.size
        ));
        Ok(UploadStatus::new(
            metadata.size,
            metadata.size,
            true,
            Some(metadata),
        ))
    }

    async fn get_metadata(&self, location: &Location) -> StorageResult<ObjectMetadata> {
        if location.is_root() {
            return Err(invalid_root_operation("get_metadata"));
        }
        self.state
            .lock()
            .unwrap()
            .objects
            .get(location)
            .map(|object| object.metadata.clone())
            .ok_or_else(|| object_not_found(location.path()))
    }

    async fn download_url(&self, location: &Location) -> StorageResult<String> {
        let metadata = self.get_metadata(location).await?;
        let token = metadata.first_download_token().ok_or_else(no_download_url)?;
        location.download_url(&self.host, token)
    }

    async fn delete_object(&self, location: &Location) -> StorageResult<()> {
        if location.is_root() {
            return Err(invalid_root_operation("delete"));
        }
        match self.state.lock().unwrap().objects.remove(location) {
            Some(_) => Ok(()),
            None => Err(object_not_found(location.path())),
        }
    }
}

fn generate_id(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(length)
        .collect()
}

/// Random token laid out like a v4 UUID.
fn generate_download_token() -> String {
    let value: u128 = thread_rng().gen();
    let hex = format!("{value:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
