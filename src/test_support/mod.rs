//! Seeding helpers and collaborator doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::documents::error::unavailable;
use crate::documents::{
    DocumentData, DocumentError, DocumentKey, DocumentResult, DocumentSnapshot, DocumentStore,
    InMemoryDocumentStore, ListenerRegistration, Query, QuerySnapshot, SnapshotCallback,
};
use crate::storage::{
    self, BlobStore, InMemoryBlobStore, Location, ObjectMetadata, StorageResult, UploadMetadata,
    UploadSession, UploadStatus,
};

pub fn object(value: Value) -> DocumentData {
    match value {
        Value::Object(map) => map,
        _ => DocumentData::new(),
    }
}

pub fn product_data(name: &str) -> DocumentData {
    object(json!({
        "name": name,
        "cost": 2.5,
        "description": format!("{name} description"),
        "quantity": 1,
        "remaining": 10,
        "image": format!("https://cdn.example.com/{}.png", name.to_lowercase()),
    }))
}

pub async fn seed_products(store: &dyn DocumentStore, names: &[&str]) -> Vec<String> {
    let mut ids = Vec::new();
    for name in names {
        let key = store.add_document("products", product_data(name)).await.unwrap();
        ids.push(key.id().to_string());
    }
    ids
}

/// Orders numbered from 1, the n-th placed by `customer{n-1}@example.com`.
pub async fn seed_orders(store: &dyn DocumentStore, count: usize) -> Vec<String> {
    let mut ids = Vec::new();
    for index in 0..count {
        let data = object(json!({
            "orderNo": index + 1,
            "grandTotal": 100.0 + index as f64,
            "code": "00100",
            "phone": "0712345678",
            "mpesaCode": format!("QK{index:04}"),
            "email": format!("customer{index}@example.com"),
        }));
        let key = store.add_document("orders", data).await.unwrap();
        ids.push(key.id().to_string());
    }
    ids
}

pub async fn seed_cart(store: &dyn DocumentStore, email: &str, names: &[&str]) -> Vec<String> {
    let mut ids = Vec::new();
    for name in names {
        let data = object(json!({ "name": name, "quantity": 1, "userEmail": email }));
        let key = store.add_document("cart", data).await.unwrap();
        ids.push(key.id().to_string());
    }
    ids
}

/// Holds document writes until released.
#[derive(Clone)]
pub struct WriteGate {
    blocked: (async_channel::Sender<()>, async_channel::Receiver<()>),
    release: (async_channel::Sender<()>, async_channel::Receiver<()>),
}

impl WriteGate {
    fn new() -> Self {
        Self {
            blocked: async_channel::unbounded(),
            release: async_channel::unbounded(),
        }
    }

    /// Resolves once a write is waiting on the gate.
    pub async fn wait_until_blocked(&self) {
        let _ = self.blocked.1.recv().await;
    }

    pub fn release(&self) {
        self.release.0.close();
    }

    async fn pass(&self) {
        let _ = self.blocked.0.try_send(());
        let _ = self.release.1.recv().await;
    }
}

#[derive(Default)]
struct Recorded {
    adds: usize,
    updates: usize,
    sets: usize,
    deletes: usize,
    queries: HashMap<String, usize>,
    fail_write: Option<String>,
    fail_query: Option<String>,
    gate: Option<WriteGate>,
    listeners: Vec<SnapshotCallback>,
}

/// Wraps an [`InMemoryDocumentStore`], counting calls and injecting failures.
pub struct RecordingDocumentStore {
    inner: InMemoryDocumentStore,
    recorded: Mutex<Recorded>,
}

impl RecordingDocumentStore {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self {
            inner,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }

    pub fn adds(&self) -> usize {
        self.recorded.lock().unwrap().adds
    }

    pub fn updates(&self) -> usize {
        self.recorded.lock().unwrap().updates
    }

    pub fn deletes(&self) -> usize {
        self.recorded.lock().unwrap().deletes
    }

    pub fn writes(&self) -> usize {
        let recorded = self.recorded.lock().unwrap();
        recorded.adds + recorded.updates + recorded.sets + recorded.deletes
    }

    pub fn queries_on(&self, collection: &str) -> usize {
        self.recorded
            .lock()
            .unwrap()
            .queries
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    pub fn reset_counts(&self) {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.adds = 0;
        recorded.updates = 0;
        recorded.sets = 0;
        recorded.deletes = 0;
        recorded.queries.clear();
    }

    /// The next add, set, update or delete fails with `documents/unavailable`.
    pub fn fail_next_write(&self, message: &str) {
        self.recorded.lock().unwrap().fail_write = Some(message.to_string());
    }

    pub fn fail_next_query(&self, message: &str) {
        self.recorded.lock().unwrap().fail_query = Some(message.to_string());
    }

    pub fn hold_writes(&self) -> WriteGate {
        let gate = WriteGate::new();
        self.recorded.lock().unwrap().gate = Some(gate.clone());
        gate
    }

    /// Terminates every listener registered through this store with `error`.
    /// Hands `snapshot` to every listener attached so far, as a late delivery would.
    pub fn deliver_to_listeners(&self, snapshot: QuerySnapshot) {
        let listeners = self.recorded.lock().unwrap().listeners.clone();
        for listener in listeners {
            listener(Ok(snapshot.clone()));
        }
    }

    pub fn fail_listeners(&self, error: DocumentError) {
        let listeners = std::mem::take(&mut self.recorded.lock().unwrap().listeners);
        for listener in listeners {
            listener(Err(error.clone()));
        }
    }

    async fn before_write(&self, record: impl FnOnce(&mut Recorded)) -> DocumentResult<()> {
        let (failure, gate) = {
            let mut recorded = self.recorded.lock().unwrap();
            match recorded.fail_write.take() {
                Some(message) => (Some(message), None),
                None => {
                    record(&mut recorded);
                    (None, recorded.gate.clone())
                }
            }
        };
        if let Some(message) = failure {
            return Err(unavailable(message));
        }
        if let Some(gate) = gate {
            gate.pass().await;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RecordingDocumentStore {
    async fn get_document(&self, key: &DocumentKey) -> DocumentResult<DocumentSnapshot> {
        self.inner.get_document(key).await
    }

    async fn add_document(&self, collection: &str, data: DocumentData) -> DocumentResult<DocumentKey> {
        self.before_write(|recorded| recorded.adds += 1).await?;
        self.inner.add_document(collection, data).await
    }

    async fn set_document(&self, key: &DocumentKey, data: DocumentData) -> DocumentResult<()> {
        self.before_write(|recorded| recorded.sets += 1).await?;
        self.inner.set_document(key, data).await
    }

    async fn update_document(&self, key: &DocumentKey, data: DocumentData) -> DocumentResult<()> {
        self.before_write(|recorded| recorded.updates += 1).await?;
        self.inner.update_document(key, data).await
    }

    async fn delete_document(&self, key: &DocumentKey) -> DocumentResult<()> {
        self.before_write(|recorded| recorded.deletes += 1).await?;
        self.inner.delete_document(key).await
    }

    async fn run_query(&self, query: &Query) -> DocumentResult<QuerySnapshot> {
        let failure = {
            let mut recorded = self.recorded.lock().unwrap();
            *recorded
                .queries
                .entry(query.collection_id().to_string())
                .or_default() += 1;
            recorded.fail_query.take()
        };
        if let Some(message) = failure {
            return Err(unavailable(message));
        }
        self.inner.run_query(query).await
    }

    fn listen(&self, query: Query, callback: SnapshotCallback) -> DocumentResult<ListenerRegistration> {
        self.recorded
            .lock()
            .unwrap()
            .listeners
            .push(Arc::clone(&callback));
        self.inner.listen(query, callback)
    }
}

#[derive(Default)]
struct ChunkLog {
    sizes: Vec<usize>,
    fail_next: bool,
}

/// Wraps an [`InMemoryBlobStore`], logging chunk sizes and failing on demand.
pub struct FlakyBlobStore {
    inner: InMemoryBlobStore,
    log: Mutex<ChunkLog>,
}

impl FlakyBlobStore {
    pub fn new(inner: InMemoryBlobStore) -> Self {
        Self {
            inner,
            log: Mutex::new(ChunkLog::default()),
        }
    }

    pub fn inner(&self) -> &InMemoryBlobStore {
        &self.inner
    }

    /// Sizes of the chunks handed to the inner store.
    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.log.lock().unwrap().sizes.clone()
    }

    /// The next chunk is rejected with `storage/unavailable`.
    pub fn fail_next_chunk(&self) {
        self.log.lock().unwrap().fail_next = true;
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn start_upload(
        &self,
        location: &Location,
        total_bytes: u64,
        metadata: Option<UploadMetadata>,
    ) -> StorageResult<UploadSession> {
        self.inner.start_upload(location, total_bytes, metadata).await
    }

    async fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        chunk: Bytes,
        finalize: bool,
    ) -> StorageResult<UploadStatus> {
        {
            let mut log = self.log.lock().unwrap();
            if std::mem::take(&mut log.fail_next) {
                return Err(storage::unavailable("connection reset"));
            }
            log.sizes.push(chunk.len());
        }
        self.inner.upload_chunk(session, offset, chunk, finalize).await
    }

    async fn get_metadata(&self, location: &Location) -> StorageResult<ObjectMetadata> {
        self.inner.get_metadata(location).await
    }

    async fn download_url(&self, location: &Location) -> StorageResult<String> {
        self.inner.download_url(location).await
    }

    async fn delete_object(&self, location: &Location) -> StorageResult<()> {
        self.inner.delete_object(location).await
    }
}
