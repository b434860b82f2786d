use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::documents::error::DocumentResult;
use crate::documents::key::DocumentKey;
use crate::documents::query::Query;
use crate::documents::snapshot::{DocumentData, DocumentSnapshot, QuerySnapshot};

/// Receives the full result set of a listened query on every change, or the
/// error that terminated the listener.
pub type SnapshotCallback = Arc<dyn Fn(DocumentResult<QuerySnapshot>) + Send + Sync + 'static>;

/// Releases a listener when invoked.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync + 'static>;

/// The document database consumed by the dashboard.
///
/// Implementations deliver snapshots to listeners synchronously from the
/// writing call or from their own transport task; callbacks must not block.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Reads a single document. A missing document is not an error.
    async fn get_document(&self, key: &DocumentKey) -> DocumentResult<DocumentSnapshot>;

    /// Creates a document with a store-assigned id.
    async fn add_document(&self, collection: &str, data: DocumentData) -> DocumentResult<DocumentKey>;

    /// Creates or replaces the document at `key`.
    async fn set_document(&self, key: &DocumentKey, data: DocumentData) -> DocumentResult<()>;

    /// Overwrites the given fields of an existing document.
    ///
    /// # Errors
    /// Returns `documents/not-found` when the document does not exist.
    async fn update_document(&self, key: &DocumentKey, data: DocumentData) -> DocumentResult<()>;

    /// Deletes the document at `key`. Deleting a missing document succeeds.
    async fn delete_document(&self, key: &DocumentKey) -> DocumentResult<()>;

    async fn run_query(&self, query: &Query) -> DocumentResult<QuerySnapshot>;

    /// Registers `callback` for `query`. The current result set is delivered
    /// before this returns, then again after every change to the collection.
    fn listen(&self, query: Query, callback: SnapshotCallback) -> DocumentResult<ListenerRegistration>;
}

/// RAII listener handle; dropping it detaches the listener.
pub struct ListenerRegistration {
    unsubscribe: Option<Unsubscribe>,
}

impl ListenerRegistration {
    pub fn new(unsubscribe: Unsubscribe) -> Self {
        Self {
            unsubscribe: Some(unsubscribe),
        }
    }

    pub fn detach(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("attached", &self.unsubscribe.is_some())
            .finish()
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// A listened query exposed as a stream of snapshot events.
///
/// Each item is a complete replacement of the previous result set, never a diff.
#[derive(Debug)]
pub struct SnapshotStream {
    registration: ListenerRegistration,
    receiver: async_channel::Receiver<DocumentResult<QuerySnapshot>>,
}

impl SnapshotStream {
    /// Waits for the next snapshot. Returns `None` once the stream is closed.
    pub async fn next(&self) -> Option<DocumentResult<QuerySnapshot>> {
        self.receiver.recv().await.ok()
    }

    /// Returns an already delivered snapshot without waiting.
    pub fn try_next(&self) -> Option<DocumentResult<QuerySnapshot>> {
        self.receiver.try_recv().ok()
    }

    pub fn close(self) {
        self.registration.detach();
        self.receiver.close();
    }
}

/// Listens to `query` and forwards every delivery into a [`SnapshotStream`].
pub fn snapshot_stream(store: &dyn DocumentStore, query: Query) -> DocumentResult<SnapshotStream> {
    let (sender, receiver) = async_channel::unbounded();
    let registration = store.listen(
        query,
        Arc::new(move |result| {
            let _ = sender.try_send(result);
        }),
    )?;
    Ok(SnapshotStream {
        registration,
        receiver,
    })
}
