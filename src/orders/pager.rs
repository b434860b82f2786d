use std::sync::{Arc, LazyLock, Mutex};

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;

use crate::documents::{
    DocumentConverter, DocumentCursor, DocumentKey, DocumentSnapshot, DocumentStore,
    FilterOperator, Query,
};
use crate::logger::Logger;
use crate::orders::error::{invalid_page_size, OrderError, OrderResult};
use crate::orders::model::{CartItem, CartItemConverter, Order, OrderConverter};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@storefront/orders"));

pub const DEFAULT_ORDER_PAGE_SIZE: u32 = 20;

/// How cart lookups for the orders of one page are issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartLookup {
    /// One query after the other, in page order.
    #[default]
    Sequential,
    /// All queries of a page in flight at once.
    Concurrent,
}

/// Opaque position of the last order of a fetched page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderCursor(DocumentCursor);

#[derive(Clone, Debug, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// `None` when the page was empty.
    pub next_cursor: Option<OrderCursor>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderPagerConfig {
    pub orders_collection: String,
    pub cart_collection: String,
    pub page_size: u32,
    pub cart_lookup: CartLookup,
}

impl Default for OrderPagerConfig {
    fn default() -> Self {
        Self {
            orders_collection: "orders".to_string(),
            cart_collection: "cart".to_string(),
            page_size: DEFAULT_ORDER_PAGE_SIZE,
            cart_lookup: CartLookup::Sequential,
        }
    }
}

#[derive(Default)]
struct PagerState {
    orders: Vec<Order>,
    cursor: Option<OrderCursor>,
    in_flight: usize,
}

impl PagerState {
    /// Known ids keep their position and take the new value; new ids are appended.
    fn merge(&mut self, page: &[Order]) {
        for order in page {
            match self.orders.iter_mut().find(|known| known.id == order.id) {
                Some(known) => *known = order.clone(),
                None => self.orders.push(order.clone()),
            }
        }
    }
}

struct LoadingGuard<'a> {
    state: &'a Mutex<PagerState>,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a Mutex<PagerState>) -> Self {
        state.lock().unwrap().in_flight += 1;
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().unwrap().in_flight -= 1;
    }
}

/// Pages through the orders collection, attaching each order's cart.
///
/// Every order costs one extra query on the cart collection, matched on
/// `userEmail`. Loaded pages accumulate in [`orders`](Self::orders).
pub struct OrderPager {
    store: Arc<dyn DocumentStore>,
    config: OrderPagerConfig,
    state: Mutex<PagerState>,
}

impl OrderPager {
    pub fn new(store: Arc<dyn DocumentStore>, config: OrderPagerConfig) -> OrderResult<Self> {
        if config.page_size == 0 {
            return Err(invalid_page_size(0));
        }
        Ok(Self {
            store,
            config,
            state: Mutex::new(PagerState::default()),
        })
    }

    pub fn config(&self) -> &OrderPagerConfig {
        &self.config
    }

    /// Fetches one page after `cursor` (the first page for `None`) with carts
    /// attached. The accumulated orders are not touched.
    pub async fn fetch_page(&self, cursor: Option<&OrderCursor>) -> OrderResult<OrderPage> {
        let mut query =
            Query::collection(self.config.orders_collection.as_str())?.limit(self.config.page_size)?;
        if let Some(OrderCursor(position)) = cursor {
            query = query.start_after(position.clone());
        }

        let snapshot = self.store.run_query(&query).await?;
        let next_cursor = snapshot.last_cursor().map(OrderCursor);
        let mut orders = decode_all(&OrderConverter, snapshot.documents())?;

        match self.config.cart_lookup {
            CartLookup::Sequential => {
                for order in orders.iter_mut() {
                    order.cart = self.cart_for(order).await?;
                }
            }
            CartLookup::Concurrent => {
                let carts = try_join_all(orders.iter().map(|order| self.cart_for(order))).await?;
                for (order, cart) in orders.iter_mut().zip(carts) {
                    order.cart = cart;
                }
            }
        }

        LOGGER.debug(format!(
            "fetched {} orders from '{}'",
            orders.len(),
            self.config.orders_collection
        ));
        Ok(OrderPage {
            orders,
            next_cursor,
        })
    }

    async fn cart_for(&self, order: &Order) -> OrderResult<Vec<CartItem>> {
        let Some(email) = order.cart_email() else {
            return Ok(Vec::new());
        };
        let query = Query::collection(self.config.cart_collection.as_str())?.where_field(
            "userEmail",
            FilterOperator::Equal,
            Value::String(email.to_string()),
        )?;
        let snapshot = self.store.run_query(&query).await?;
        decode_all(&CartItemConverter, snapshot.documents())
    }

    /// Fetches the page after `cursor`, merges it into the accumulated orders and
    /// remembers its cursor for [`next`](Self::next).
    pub async fn load(&self, cursor: Option<OrderCursor>) -> OrderResult<OrderPage> {
        let _loading = LoadingGuard::new(&self.state);
        let page = match self.fetch_page(cursor.as_ref()).await {
            Ok(page) => page,
            Err(err) => {
                LOGGER.error(format!("failed to load orders: {err}"));
                return Err(err);
            }
        };
        let mut state = self.state.lock().unwrap();
        state.merge(&page.orders);
        state.cursor = page.next_cursor.clone();
        Ok(page)
    }

    /// Loads the page after the last one. Does nothing without a cursor.
    pub async fn next(&self) -> OrderResult<Option<OrderPage>> {
        let cursor = self.state.lock().unwrap().cursor.clone();
        match cursor {
            Some(cursor) => self.load(Some(cursor)).await.map(Some),
            None => Ok(None),
        }
    }

    /// Loads the first page again. There is no backward paging.
    pub async fn previous(&self) -> OrderResult<OrderPage> {
        self.load(None).await
    }

    /// Deletes the order document and drops it from the accumulated orders.
    pub async fn delete_order(&self, id: &str) -> OrderResult<()> {
        let _loading = LoadingGuard::new(&self.state);
        let key = DocumentKey::new(self.config.orders_collection.as_str(), id)?;
        if let Err(err) = self.store.delete_document(&key).await {
            LOGGER.error(format!("failed to delete order {id}: {err}"));
            return Err(err.into());
        }
        self.state
            .lock()
            .unwrap()
            .orders
            .retain(|order| order.id != id);
        LOGGER.info(format!("deleted order {id}"));
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().in_flight > 0
    }

    pub fn has_next(&self) -> bool {
        self.state.lock().unwrap().cursor.is_some()
    }

    pub fn cursor(&self) -> Option<OrderCursor> {
        self.state.lock().unwrap().cursor.clone()
    }

    /// Accumulated orders, in first-seen order.
    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn order(&self, id: &str) -> Option<Order> {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn decode_all<C>(converter: &C, documents: &[DocumentSnapshot]) -> OrderResult<Vec<C::Model>>
where
    C: DocumentConverter,
{
    documents
        .iter()
        .map(|document| converter.from_snapshot(document).map_err(OrderError::from))
        .collect()
}
