use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::documents::DocumentError;
use crate::storage::StorageError;

/// Alert shown when the editor is submitted with an empty field.
pub const MISSING_FIELDS_ALERT: &str = "Please fill all the fields";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductErrorCode {
    MissingFields,
    InvalidField,
    EditorClosed,
    SubmitInProgress,
    UnknownProduct,
    UploadFailed,
    Backend,
}

impl ProductErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductErrorCode::MissingFields => "products/missing-fields",
            ProductErrorCode::InvalidField => "products/invalid-field",
            ProductErrorCode::EditorClosed => "products/editor-closed",
            ProductErrorCode::SubmitInProgress => "products/submit-in-progress",
            ProductErrorCode::UnknownProduct => "products/unknown-product",
            ProductErrorCode::UploadFailed => "products/upload-failed",
            ProductErrorCode::Backend => "products/backend",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductError {
    pub code: ProductErrorCode,
    message: String,
    cause: Option<&'static str>,
}

impl ProductError {
    pub fn new(code: ProductErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Code of the storage or document error this one wraps.
    pub fn cause_code(&self) -> Option<&'static str> {
        self.cause
    }

    /// True for failures detected before anything was uploaded or written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ProductErrorCode::MissingFields | ProductErrorCode::InvalidField
        )
    }

    /// Text of the alert presented to the operator.
    pub fn alert_text(&self) -> String {
        match self.code {
            ProductErrorCode::MissingFields => MISSING_FIELDS_ALERT.to_string(),
            _ => format!("Error: {}", self.message),
        }
    }
}

impl Display for ProductError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for ProductError {}

impl From<DocumentError> for ProductError {
    fn from(error: DocumentError) -> Self {
        Self {
            code: ProductErrorCode::Backend,
            message: error.message().to_string(),
            cause: Some(error.code_str()),
        }
    }
}

impl From<StorageError> for ProductError {
    fn from(error: StorageError) -> Self {
        Self {
            code: ProductErrorCode::UploadFailed,
            message: error.message().to_string(),
            cause: Some(error.code_str()),
        }
    }
}

pub type ProductResult<T> = Result<T, ProductError>;

pub fn missing_fields(fields: &[&str]) -> ProductError {
    let mut error = ProductError::new(ProductErrorCode::MissingFields, MISSING_FIELDS_ALERT);
    if !fields.is_empty() {
        error.message = format!("{MISSING_FIELDS_ALERT} (missing: {})", fields.join(", "));
    }
    error
}

pub fn invalid_field(field: &str, value: &str, expected: &str) -> ProductError {
    ProductError::new(
        ProductErrorCode::InvalidField,
        format!("Field '{field}' must be {expected}, got '{value}'"),
    )
}

pub fn editor_closed() -> ProductError {
    ProductError::new(ProductErrorCode::EditorClosed, "The product editor is not open")
}

pub fn submit_in_progress() -> ProductError {
    ProductError::new(
        ProductErrorCode::SubmitInProgress,
        "A product submission is already in progress",
    )
}

pub fn unknown_product(id: &str) -> ProductError {
    ProductError::new(
        ProductErrorCode::UnknownProduct,
        format!("No product with id '{id}' in the catalog"),
    )
}
