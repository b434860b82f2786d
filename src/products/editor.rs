use std::sync::{Arc, LazyLock, Mutex};

use crate::documents::{DocumentConverter, DocumentKey, DocumentStore};
use crate::logger::Logger;
use crate::products::error::{
    editor_closed, invalid_field, missing_fields, submit_in_progress, ProductResult,
};
use crate::products::image::{ImageFile, ImageUploader};
use crate::products::model::{Product, ProductConverter};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@storefront/products"));

/// Whether a submit creates a product or overwrites an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Open(EditorMode),
    Submitting(EditorMode),
}

/// Image attached to the form: a local file still to upload, or the URL the
/// product already points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Staged(ImageFile),
    Existing(String),
}

/// Raw form input. Numbers stay text until submit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub cost: String,
    pub description: String,
    pub remaining: String,
    pub image: Option<ImageSource>,
}

impl ProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-populated from `product`, reusing its image URL.
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            cost: product.cost.to_string(),
            description: product.description.clone(),
            remaining: product.remaining.to_string(),
            image: (!product.image.trim().is_empty())
                .then(|| ImageSource::Existing(product.image.clone())),
        }
    }

    pub fn stage_image(&mut self, file: ImageFile) {
        self.image = Some(ImageSource::Staged(file));
    }

    /// Fields that are empty or whitespace, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let image_present = match &self.image {
            Some(ImageSource::Staged(file)) => !file.name().trim().is_empty(),
            Some(ImageSource::Existing(url)) => !url.trim().is_empty(),
            None => false,
        };
        [
            ("cost", !self.cost.trim().is_empty()),
            ("description", !self.description.trim().is_empty()),
            ("name", !self.name.trim().is_empty()),
            ("remaining", !self.remaining.trim().is_empty()),
            ("image", image_present),
        ]
        .into_iter()
        .filter_map(|(field, present)| (!present).then_some(field))
        .collect()
    }

    fn validate(&self) -> ProductResult<ValidatedForm> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing_fields(&missing));
        }
        let cost = leading_float(&self.cost)
            .ok_or_else(|| invalid_field("cost", self.cost.trim(), "a number"))?;
        let remaining = leading_integer(&self.remaining)
            .ok_or_else(|| invalid_field("remaining", self.remaining.trim(), "a number"))?;
        let image = self.image.clone().ok_or_else(|| missing_fields(&["image"]))?;
        Ok(ValidatedForm {
            name: self.name.clone(),
            cost,
            description: self.description.clone(),
            remaining,
            image,
        })
    }
}

/// Reads the longest decimal prefix of `text`, so `"12.5 KES"` is 12.5.
fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        start + bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }
    text[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Reads the leading base-10 integer of `text`, so `"3.5"` is 3.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let sign = text.len() - unsigned.len();
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    text[..sign + digits].parse().ok()
}

struct ValidatedForm {
    name: String,
    cost: f64,
    description: String,
    remaining: i64,
    image: ImageSource,
}

/// Result of a successful submit, carrying the product id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(String),
    Updated(String),
}

impl SubmitOutcome {
    pub fn id(&self) -> &str {
        match self {
            SubmitOutcome::Created(id) | SubmitOutcome::Updated(id) => id,
        }
    }
}

struct EditSession {
    mode: EditorMode,
    form: ProductForm,
}

/// Add/edit dialog for products.
///
/// The form lives only while the editor is open. A submit validates it, uploads
/// a staged image, then performs exactly one create or update. On failure the
/// form is left as it was so the operator can retry. While a submit is in
/// flight every other action fails with `products/submit-in-progress`.
pub struct ProductEditor {
    documents: Arc<dyn DocumentStore>,
    uploader: ImageUploader,
    collection: String,
    session: Mutex<Option<EditSession>>,
    submitting: async_lock::Mutex<()>,
}

impl ProductEditor {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        uploader: ImageUploader,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            uploader,
            collection: collection.into(),
            session: Mutex::new(None),
            submitting: async_lock::Mutex::new(()),
        }
    }

    fn is_submitting(&self) -> bool {
        self.submitting.try_lock().is_none()
    }

    fn ensure_idle(&self) -> ProductResult<()> {
        if self.is_submitting() {
            Err(submit_in_progress())
        } else {
            Ok(())
        }
    }

    pub fn state(&self) -> EditorState {
        let session = self.session.lock().unwrap();
        match session.as_ref() {
            None => EditorState::Closed,
            Some(session) if self.is_submitting() => EditorState::Submitting(session.mode.clone()),
            Some(session) => EditorState::Open(session.mode.clone()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    /// Opens an empty form. An open form is replaced.
    pub fn open_create(&self) -> ProductResult<()> {
        self.open(EditorMode::Create, ProductForm::new())
    }

    /// Opens a form pre-populated from `product`. An open form is replaced.
    pub fn open_edit(&self, product: &Product) -> ProductResult<()> {
        self.open(
            EditorMode::Edit(product.id.clone()),
            ProductForm::from_product(product),
        )
    }

    fn open(&self, mode: EditorMode, form: ProductForm) -> ProductResult<()> {
        self.ensure_idle()?;
        LOGGER.debug(format!("editor opened in {mode:?} mode"));
        *self.session.lock().unwrap() = Some(EditSession { mode, form });
        Ok(())
    }

    /// Copy of the current form, `None` when closed.
    pub fn form(&self) -> Option<ProductForm> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| session.form.clone())
    }

    pub fn edit_form<F, R>(&self, edit: F) -> ProductResult<R>
    where
        F: FnOnce(&mut ProductForm) -> R,
    {
        self.ensure_idle()?;
        let mut session = self.session.lock().unwrap();
        let session = session.as_mut().ok_or_else(editor_closed)?;
        Ok(edit(&mut session.form))
    }

    /// Discards the form and closes the editor.
    pub fn cancel(&self) -> ProductResult<()> {
        self.ensure_idle()?;
        self.session.lock().unwrap().take();
        Ok(())
    }

    pub async fn submit(&self) -> ProductResult<SubmitOutcome> {
        let Some(_submitting) = self.submitting.try_lock() else {
            return Err(submit_in_progress());
        };
        let (mode, form) = {
            let session = self.session.lock().unwrap();
            let session = session.as_ref().ok_or_else(editor_closed)?;
            (session.mode.clone(), session.form.clone())
        };

        let validated = match form.validate() {
            Ok(validated) => validated,
            Err(err) => {
                LOGGER.debug(format!("submit rejected: {err}"));
                return Err(err);
            }
        };

        let result = self.write(mode, validated).await;
        match &result {
            Ok(outcome) => {
                self.session.lock().unwrap().take();
                LOGGER.info(format!("product saved: {outcome:?}"));
            }
            Err(err) => LOGGER.warn(format!("product submit failed: {err}")),
        }
        result
    }

    async fn write(&self, mode: EditorMode, form: ValidatedForm) -> ProductResult<SubmitOutcome> {
        let image = match form.image {
            ImageSource::Staged(file) => self.uploader.upload(&file).await?,
            ImageSource::Existing(url) => url,
        };
        let product = Product::new(form.name, form.cost, form.description, form.remaining, image);
        let data = ProductConverter.to_data(&product)?;

        match mode {
            EditorMode::Create => {
                let key = self.documents.add_document(&self.collection, data).await?;
                Ok(SubmitOutcome::Created(key.id().to_string()))
            }
            EditorMode::Edit(id) => {
                let key = DocumentKey::new(self.collection.as_str(), id.as_str())?;
                self.documents.update_document(&key, data).await?;
                Ok(SubmitOutcome::Updated(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::InMemoryDocumentStore;
    use crate::products::error::ProductErrorCode;
    use crate::storage::InMemoryBlobStore;
    use crate::test_support::{FlakyBlobStore, RecordingDocumentStore};
    use bytes::Bytes;

    struct Fixture {
        documents: Arc<RecordingDocumentStore>,
        blobs: Arc<FlakyBlobStore>,
        editor: ProductEditor,
    }

    fn fixture() -> Fixture {
        let documents = Arc::new(RecordingDocumentStore::new(InMemoryDocumentStore::new()));
        let blobs = Arc::new(FlakyBlobStore::new(InMemoryBlobStore::new()));
        let uploader = ImageUploader::new(blobs.clone(), "shop", "");
        let editor = ProductEditor::new(documents.clone(), uploader, "products");
        Fixture {
            documents,
            blobs,
            editor,
        }
    }

    fn fill(form: &mut ProductForm) {
        form.name = "Tea".into();
        form.cost = "2.50".into();
        form.description = "Green".into();
        form.remaining = "7".into();
        form.stage_image(ImageFile::new("tea.png", Bytes::from_static(b"png")));
    }

    #[tokio::test]
    async fn create_uploads_then_adds() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        assert_eq!(fx.editor.state(), EditorState::Open(EditorMode::Create));
        fx.editor.edit_form(fill).unwrap();

        let outcome = fx.editor.submit().await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Created(_)));
        assert_eq!(fx.editor.state(), EditorState::Closed);
        assert!(fx.editor.form().is_none());
        assert_eq!((fx.documents.adds(), fx.documents.updates()), (1, 0));
        assert_eq!(fx.blobs.inner().object_count(), 1);

        let key = DocumentKey::new("products", outcome.id()).unwrap();
        let stored = fx.documents.get_document(&key).await.unwrap();
        let product = ProductConverter.from_snapshot(&stored).unwrap();
        assert_eq!(product.cost, 2.5);
        assert_eq!(product.remaining, 7);
        assert_eq!(product.quantity, 1);
        assert!(product.image.contains("/o/tea.png?alt=media&token="));
    }

    #[tokio::test]
    async fn edit_prepopulates_and_reuses_image() {
        let fx = fixture();
        let original = Product::new("Mug", 9.0, "Ceramic", 3, "https://cdn/mug.png");
        let data = ProductConverter.to_data(&original).unwrap();
        let key = fx.documents.add_document("products", data).await.unwrap();
        let original = original.with_id(key.id());

        fx.editor.open_edit(&original).unwrap();
        let form = fx.editor.form().unwrap();
        assert_eq!(form.name, "Mug");
        assert_eq!(form.cost, "9");
        assert_eq!(form.remaining, "3");
        assert_eq!(form.image, Some(ImageSource::Existing("https://cdn/mug.png".into())));

        fx.editor.edit_form(|form| form.remaining = "2".into()).unwrap();
        let outcome = fx.editor.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Updated(key.id().to_string()));
        assert_eq!((fx.documents.adds(), fx.documents.updates()), (1, 1));
        assert_eq!(fx.blobs.chunk_sizes().len(), 0);
        let stored = fx.documents.get_document(&key).await.unwrap();
        let product = ProductConverter.from_snapshot(&stored).unwrap();
        assert_eq!(product.remaining, 2);
        assert_eq!(product.image, "https://cdn/mug.png");
    }

    #[tokio::test]
    async fn missing_fields_write_nothing() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        fx.editor
            .edit_form(|form| {
                fill(form);
                form.description = "   ".into();
            })
            .unwrap();

        let err = fx.editor.submit().await.unwrap_err();

        assert_eq!(err.code, ProductErrorCode::MissingFields);
        assert_eq!(err.alert_text(), "Please fill all the fields");
        assert_eq!(fx.documents.writes(), 0);
        assert!(fx.blobs.chunk_sizes().is_empty());
        assert!(fx.editor.is_open());
    }

    #[tokio::test]
    async fn non_numeric_cost_is_invalid() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        fx.editor
            .edit_form(|form| {
                fill(form);
                form.cost = "cheap".into();
            })
            .unwrap();

        let err = fx.editor.submit().await.unwrap_err();
        assert_eq!(err.code, ProductErrorCode::InvalidField);
        assert!(err.is_validation());
        assert_eq!(fx.documents.writes(), 0);
    }

    #[tokio::test]
    async fn numbers_are_read_from_their_leading_digits() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        fx.editor
            .edit_form(|form| {
                fill(form);
                form.cost = " 12.5 KES".into();
                form.remaining = "3.5".into();
            })
            .unwrap();

        let outcome = fx.editor.submit().await.unwrap();

        let key = DocumentKey::new("products", outcome.id()).unwrap();
        let stored = fx.documents.get_document(&key).await.unwrap();
        let product = ProductConverter.from_snapshot(&stored).unwrap();
        assert_eq!(product.cost, 12.5);
        assert_eq!(product.remaining, 3);
    }

    #[test]
    fn leading_number_prefixes() {
        assert_eq!(leading_float("4.50"), Some(4.5));
        assert_eq!(leading_float(".5"), Some(0.5));
        assert_eq!(leading_float("-2e3x"), Some(-2000.0));
        assert_eq!(leading_float("7e"), Some(7.0));
        assert_eq!(leading_float("."), None);
        assert_eq!(leading_float("KES 4"), None);

        assert_eq!(leading_integer("3.9"), Some(3));
        assert_eq!(leading_integer("  -12 left"), Some(-12));
        assert_eq!(leading_integer("+"), None);
        assert_eq!(leading_integer("many"), None);
    }

    #[tokio::test]
    async fn failed_write_keeps_form_for_retry() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        fx.editor.edit_form(fill).unwrap();
        let before = fx.editor.form();

        fx.documents.fail_next_write("quota exceeded");
        let err = fx.editor.submit().await.unwrap_err();

        assert_eq!(err.alert_text(), "Error: quota exceeded");
        assert_eq!(fx.editor.form(), before);
        assert!(fx.editor.is_open());

        fx.editor.submit().await.unwrap();
        assert_eq!(fx.documents.adds(), 1);
        assert!(!fx.editor.is_open());
    }

    #[tokio::test]
    async fn failed_upload_skips_write() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        fx.editor.edit_form(fill).unwrap();
        fx.blobs.fail_next_chunk();

        let err = fx.editor.submit().await.unwrap_err();
        assert_eq!(err.code, ProductErrorCode::UploadFailed);
        assert!(err.alert_text().starts_with("Error: "));
        assert_eq!(fx.documents.writes(), 0);
        assert!(fx.editor.is_open());
    }

    #[tokio::test]
    async fn closed_editor_rejects_actions() {
        let fx = fixture();
        let err = fx.editor.submit().await.unwrap_err();
        assert_eq!(err.code, ProductErrorCode::EditorClosed);
        assert!(fx.editor.edit_form(fill).is_err());

        fx.editor.open_create().unwrap();
        fx.editor.cancel().unwrap();
        assert_eq!(fx.editor.state(), EditorState::Closed);
    }

    #[tokio::test]
    async fn reopening_replaces_the_form() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        fx.editor.edit_form(fill).unwrap();
        let product = Product::new("Mug", 1.0, "Blue", 1, "https://cdn/m.png").with_id("m1");
        fx.editor.open_edit(&product).unwrap();
        assert_eq!(fx.editor.state(), EditorState::Open(EditorMode::Edit("m1".into())));
        assert_eq!(fx.editor.form().unwrap().name, "Mug");
    }

    #[tokio::test]
    async fn concurrent_submit_is_rejected() {
        let fx = fixture();
        fx.editor.open_create().unwrap();
        fx.editor.edit_form(fill).unwrap();
        let gate = fx.documents.hold_writes();

        let editor = &fx.editor;
        let first = editor.submit();
        let second = async {
            gate.wait_until_blocked().await;
            assert!(matches!(editor.state(), EditorState::Submitting(EditorMode::Create)));
            assert_eq!(
                editor.edit_form(|form| form.name.clear()).unwrap_err().code,
                ProductErrorCode::SubmitInProgress
            );
            let err = editor.submit().await.unwrap_err();
            gate.release();
            err
        };
        let (first, second) = futures::future::join(first, second).await;

        assert!(first.is_ok());
        assert_eq!(second.code, ProductErrorCode::SubmitInProgress);
        assert_eq!(fx.documents.adds(), 1);
    }
}
