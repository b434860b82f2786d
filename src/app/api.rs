use std::sync::Arc;

use crate::app::errors::{invalid_options, AppResult, DashboardResult};
use crate::app::logger::LOGGER;
use crate::app::types::DashboardOptions;
use crate::documents::{DocumentKey, DocumentStore};
use crate::logger;
use crate::orders::{Order, OrderPage, OrderPager};
use crate::products::{
    error::unknown_product, EditorState, FeedEvent, FeedStatus, ImageUploader, Product,
    ProductEditor, ProductFeed, ProductForm, SubmitOutcome,
};
use crate::storage::BlobStore;

pub static LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The admin dashboard: product catalog, order list and product editor wired to
/// one document store and one blob store.
pub struct Dashboard {
    options: DashboardOptions,
    documents: Arc<dyn DocumentStore>,
    feed: ProductFeed,
    pager: OrderPager,
    editor: ProductEditor,
}

/// Validates `options`, applies their log level and builds a [`Dashboard`].
/// Nothing is read from the stores until [`Dashboard::mount`].
pub fn initialize_dashboard(
    options: DashboardOptions,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
) -> AppResult<Dashboard> {
    options.validate()?;
    if let Some(level) = options.log_level {
        logger::set_log_level(level)?;
    }

    let feed = ProductFeed::new(documents.clone(), options.products_collection.clone());
    let pager = OrderPager::new(documents.clone(), options.pager_config())
        .map_err(|err| invalid_options(err.message()))?;
    let uploader = ImageUploader::new(blobs, options.storage_bucket.clone(), &options.image_prefix);
    let editor = ProductEditor::new(
        documents.clone(),
        uploader,
        options.products_collection.clone(),
    );

    LOGGER.debug(format!(
        "dashboard {LIBRARY_VERSION} initialized for project '{}'",
        options.project_id
    ));
    Ok(Dashboard {
        options,
        documents,
        feed,
        pager,
        editor,
    })
}

impl Dashboard {
    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    pub fn feed(&self) -> &ProductFeed {
        &self.feed
    }

    pub fn pager(&self) -> &OrderPager {
        &self.pager
    }

    pub fn editor(&self) -> &ProductEditor {
        &self.editor
    }

    /// Activates the product feed, then loads the first order page. The feed
    /// stays active when the order page fails.
    pub async fn mount(&self) -> DashboardResult<()> {
        self.feed.activate()?;
        self.pager.load(None).await?;
        LOGGER.info(format!(
            "dashboard mounted: {} products, {} orders",
            self.feed.len(),
            self.pager.len()
        ));
        Ok(())
    }

    pub fn unmount(&self) {
        self.feed.deactivate();
    }

    pub fn products(&self) -> Vec<Product> {
        self.feed.products()
    }

    pub fn feed_status(&self) -> FeedStatus {
        self.feed.status()
    }

    pub fn product_events(&self) -> async_channel::Receiver<FeedEvent> {
        self.feed.events()
    }

    /// Deletes the product document. The feed drops it with the next snapshot.
    pub async fn delete_product(&self, id: &str) -> DashboardResult<()> {
        let key = DocumentKey::new(self.options.products_collection.as_str(), id)?;
        if let Err(err) = self.documents.delete_document(&key).await {
            LOGGER.error(format!("failed to delete product {id}: {err}"));
            return Err(err.into());
        }
        Ok(())
    }

    pub fn orders(&self) -> Vec<Order> {
        self.pager.orders()
    }

    pub fn is_loading_orders(&self) -> bool {
        self.pager.is_loading()
    }

    pub fn has_next_orders(&self) -> bool {
        self.pager.has_next()
    }

    pub async fn delete_order(&self, id: &str) -> DashboardResult<()> {
        Ok(self.pager.delete_order(id).await?)
    }

    /// `Ok(None)` when there is no page to continue from.
    pub async fn next_orders(&self) -> DashboardResult<Option<OrderPage>> {
        Ok(self.pager.next().await?)
    }

    pub async fn previous_orders(&self) -> DashboardResult<OrderPage> {
        Ok(self.pager.previous().await?)
    }

    pub fn editor_state(&self) -> EditorState {
        self.editor.state()
    }

    pub fn open_create(&self) -> DashboardResult<()> {
        Ok(self.editor.open_create()?)
    }

    /// Opens the editor on a product currently shown by the feed.
    pub fn open_edit(&self, product_id: &str) -> DashboardResult<()> {
        let product = self
            .feed
            .product(product_id)
            .ok_or_else(|| unknown_product(product_id))?;
        Ok(self.editor.open_edit(&product)?)
    }

    pub fn form(&self) -> Option<ProductForm> {
        self.editor.form()
    }

    pub fn edit_form<F, R>(&self, edit: F) -> DashboardResult<R>
    where
        F: FnOnce(&mut ProductForm) -> R,
    {
        Ok(self.editor.edit_form(edit)?)
    }

    pub fn cancel_edit(&self) -> DashboardResult<()> {
        Ok(self.editor.cancel()?)
    }

    pub async fn submit(&self) -> DashboardResult<SubmitOutcome> {
        Ok(self.editor.submit().await?)
    }
}
