use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::documents::error::{not_found, DocumentResult};
use crate::documents::evaluator::apply_query;
use crate::documents::key::{validate_collection_id, DocumentKey};
use crate::documents::query::Query;
use crate::documents::snapshot::{DocumentData, DocumentSnapshot, QuerySnapshot};
use crate::documents::store::{DocumentStore, ListenerRegistration, SnapshotCallback};
use crate::logger::Logger;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@storefront/documents"));

const AUTO_ID_LENGTH: usize = 20;

/// Document store that keeps every collection in process memory.
///
/// Listeners are notified synchronously from the writing call, after the
/// internal lock is released. Concurrent writers may therefore deliver out of
/// order; every snapshot carries the store version it was taken at.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<DocumentKey, StoredDocument>,
    next_sequence: u64,
    version: u64,
    listeners: BTreeMap<u64, ListenerEntry>,
    next_listener_id: u64,
}

struct StoredDocument {
    sequence: u64,
    data: DocumentData,
}

struct ListenerEntry {
    query: Query,
    callback: SnapshotCallback,
}

type Notification = (SnapshotCallback, QuerySnapshot);

impl MemoryState {
    fn snapshot_for(&self, query: &Query) -> QuerySnapshot {
        let candidates = self
            .documents
            .iter()
            .filter(|(key, _)| key.collection() == query.collection_id())
            .map(|(key, stored)| DocumentSnapshot::new(key.clone(), stored.data.clone(), stored.sequence))
            .collect();
        QuerySnapshot::new(query.collection_id(), apply_query(candidates, query))
            .with_version(self.version)
    }

    /// Stores `data` at `key`, keeping the original position of an existing document.
    fn write(&mut self, key: &DocumentKey, data: DocumentData) {
        match self.documents.get_mut(key) {
            Some(existing) => existing.data = data,
            None => {
                self.next_sequence += 1;
                let sequence = self.next_sequence;
                self.documents.insert(key.clone(), StoredDocument { sequence, data });
            }
        }
    }

    fn notifications_for(&self, collection: &str) -> Vec<Notification> {
        self.listeners
            .values()
            .filter(|entry| entry.query.collection_id() == collection)
            .map(|entry| (Arc::clone(&entry.callback), self.snapshot_for(&entry.query)))
            .collect()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub fn document_count(&self, collection: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .documents
            .keys()
            .filter(|key| key.collection() == collection)
            .count()
    }

    /// Number of attached listeners across all collections.
    pub fn listener_count(&self) -> usize {
        self.state.lock().unwrap().listeners.len()
    }

    /// Runs `mutation` under the lock and, when it reports a change, notifies the
    /// listeners of `collection` once the lock is released.
    fn mutate<T, F>(&self, collection: &str, mutation: F) -> DocumentResult<T>
    where
        F: FnOnce(&mut MemoryState) -> DocumentResult<(T, bool)>,
    {
        let (result, notifications) = {
            let mut state = self.state.lock().unwrap();
            let (result, changed) = mutation(&mut *state)?;
            let notifications = if changed {
                state.version += 1;
                state.notifications_for(collection)
            } else {
                Vec::new()
            };
            (result, notifications)
        };

        for (callback, snapshot) in notifications {
            callback(Ok(snapshot));
        }
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(&self, key: &DocumentKey) -> DocumentResult<DocumentSnapshot> {
        let state = self.state.lock().unwrap();
        Ok(match state.documents.get(key) {
            Some(stored) => DocumentSnapshot::new(key.clone(), stored.data.clone(), stored.sequence),
            None => DocumentSnapshot::missing(key.clone()),
        })
    }

    async fn add_document(&self, collection: &str, data: DocumentData) -> DocumentResult<DocumentKey> {
        validate_collection_id(collection)?;
        let key = self.mutate(collection, |state| {
            let key = loop {
                let candidate = DocumentKey::new(collection, generate_auto_id())?;
                if !state.documents.contains_key(&candidate) {
                    break candidate;
                }
            };
            state.write(&key, data);
            Ok((key, true))
        })?;
        LOGGER.debug(format!("created document {key}"));
        Ok(key)
    }

    async fn set_document(&self, key: &DocumentKey, data: DocumentData) -> DocumentResult<()> {
        self.mutate(key.collection(), |state| {
            state.write(key, data);
            Ok(((), true))
        })
    }

    async fn update_document(&self, key: &DocumentKey, data: DocumentData) -> DocumentResult<()> {
        self.mutate(key.collection(), |state| {
            let existing = state
                .documents
                .get_mut(key)
                .ok_or_else(|| not_found(format!("No document to update: {key}")))?;
            existing.data.extend(data);
            Ok(((), true))
        })
    }

    async fn delete_document(&self, key: &DocumentKey) -> DocumentResult<()> {
        let removed = self.mutate(key.collection(), |state| {
            let removed = state.documents.remove(key).is_some();
            Ok((removed, removed))
        })?;
        if removed {
            LOGGER.debug(format!("deleted document {key}"));
        }
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> DocumentResult<QuerySnapshot> {
        let state = self.state.lock().unwrap();
        Ok(state.snapshot_for(query))
    }

    fn listen(&self, query: Query, callback: SnapshotCallback) -> DocumentResult<ListenerRegistration> {
        let (id, initial) = {
            let mut state = self.state.lock().unwrap();
            state.next_listener_id += 1;
            let id = state.next_listener_id;
            let initial = state.snapshot_for(&query);
            state.listeners.insert(
                id,
                ListenerEntry {
                    query,
                    callback: Arc::clone(&callback),
                },
            );
            (id, initial)
        };
        LOGGER.debug(format!(
            "listener {id} attached to collection {}",
            initial.collection()
        ));
        callback(Ok(initial));

        let state = Arc::downgrade(&self.state);
        Ok(ListenerRegistration::new(Box::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().unwrap().listeners.remove(&id);
            }
        })))
    }
}

fn generate_auto_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(AUTO_ID_LENGTH)
        .collect()
}
