//! Product catalog: the live [`ProductFeed`], the [`ProductEditor`] form and the
//! [`ImageUploader`] it sends product pictures through.

mod editor;
pub mod error;
mod feed;
mod image;
mod model;

pub use editor::{EditorMode, EditorState, ImageSource, ProductEditor, ProductForm, SubmitOutcome};
pub use error::{ProductError, ProductErrorCode, ProductResult, MISSING_FIELDS_ALERT};
pub use feed::{FeedEvent, FeedStatus, ProductFeed};
pub use image::{ImageFile, ImageUploader};
pub use model::{Product, ProductConverter, DEFAULT_QUANTITY};
