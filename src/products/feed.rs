use std::sync::{Arc, LazyLock, Mutex};

use crate::documents::{
    DocumentConverter, DocumentError, DocumentResult, DocumentStore, ListenerRegistration, Query,
    QuerySnapshot,
};
use crate::logger::Logger;
use crate::products::error::ProductResult;
use crate::products::model::{Product, ProductConverter};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@storefront/products"));

#[derive(Clone, Debug, PartialEq)]
pub enum FeedStatus {
    Inactive,
    Live,
    /// The subscription was terminated by the store. The cache holds the last
    /// snapshot seen before the failure.
    Failed(DocumentError),
}

/// Delivered to every [`ProductFeed::events`] receiver.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    /// Full product list replacing the previous one.
    Snapshot(Vec<Product>),
    Failed(DocumentError),
}

struct FeedState {
    products: Vec<Product>,
    /// Version of the snapshot behind `products`.
    version: Option<u64>,
    status: FeedStatus,
    subscribers: Vec<async_channel::Sender<FeedEvent>>,
}

impl FeedState {
    fn publish(&mut self, event: FeedEvent) {
        self.subscribers
            .retain(|sender| sender.try_send(event.clone()).is_ok());
    }
}

/// Live view of the products collection.
///
/// While active, every change anywhere in the collection replaces the whole
/// cache with the store's current snapshot.
pub struct ProductFeed {
    store: Arc<dyn DocumentStore>,
    collection: String,
    state: Arc<Mutex<FeedState>>,
    registration: Mutex<Option<ListenerRegistration>>,
}

impl ProductFeed {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            state: Arc::new(Mutex::new(FeedState {
                products: Vec::new(),
                version: None,
                status: FeedStatus::Inactive,
                subscribers: Vec::new(),
            })),
            registration: Mutex::new(None),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Subscribes to the collection. The store's current snapshot is applied
    /// before this returns. Activating an active feed does nothing.
    pub fn activate(&self) -> ProductResult<()> {
        let mut registration = self.registration.lock().unwrap();
        if registration.is_some() {
            return Ok(());
        }

        let query = Query::collection(&self.collection)?;
        let state = Arc::downgrade(&self.state);
        let listened = self.store.listen(
            query,
            Arc::new(move |result| {
                if let Some(state) = state.upgrade() {
                    apply_result(&state, result);
                }
            }),
        );

        match listened {
            Ok(handle) => {
                *registration = Some(handle);
                LOGGER.info(format!("product feed on '{}' activated", self.collection));
                Ok(())
            }
            Err(err) => {
                apply_result(&self.state, Err(err.clone()));
                Err(err.into())
            }
        }
    }

    /// Releases the subscription. The cache keeps the last snapshot.
    pub fn deactivate(&self) {
        let handle = self.registration.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.detach();
            self.state.lock().unwrap().status = FeedStatus::Inactive;
            LOGGER.info(format!("product feed on '{}' deactivated", self.collection));
        }
    }

    pub fn is_active(&self) -> bool {
        self.registration.lock().unwrap().is_some()
    }

    /// Receiver of every later feed event. When the feed is live the current
    /// list is queued first.
    pub fn events(&self) -> async_channel::Receiver<FeedEvent> {
        let (sender, receiver) = async_channel::unbounded();
        let mut state = self.state.lock().unwrap();
        if state.status == FeedStatus::Live {
            let _ = sender.try_send(FeedEvent::Snapshot(state.products.clone()));
        }
        state.subscribers.push(sender);
        receiver
    }

    /// Products in store order.
    pub fn products(&self) -> Vec<Product> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.state
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|product| product.id == id)
            .cloned()
    }

    pub fn status(&self) -> FeedStatus {
        self.state.lock().unwrap().status.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for ProductFeed {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn apply_result(state: &Mutex<FeedState>, result: DocumentResult<QuerySnapshot>) {
    match result {
        Ok(snapshot) => {
            let version = snapshot.version();
            let products = decode_products(snapshot);
            let mut state = state.lock().unwrap();
            if state.version.is_some_and(|applied| version < applied) {
                LOGGER.debug(format!("ignoring stale product snapshot at version {version}"));
                return;
            }
            state.version = Some(version);
            state.products = products.clone();
            state.status = FeedStatus::Live;
            state.publish(FeedEvent::Snapshot(products));
        }
        Err(err) => {
            LOGGER.error(format!("product subscription failed: {err}"));
            let mut state = state.lock().unwrap();
            state.status = FeedStatus::Failed(err.clone());
            state.publish(FeedEvent::Failed(err));
        }
    }
}

fn decode_products(snapshot: QuerySnapshot) -> Vec<Product> {
    let converter = ProductConverter;
    snapshot
        .documents()
        .iter()
        .filter_map(|document| match converter.from_snapshot(document) {
            Ok(product) => Some(product),
            Err(err) => {
                LOGGER.warn(format!("skipping product {}: {err}", document.id()));
                None
            }
        })
        .collect()
}
