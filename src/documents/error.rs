use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentErrorCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Unavailable,
    Cancelled,
    DataLoss,
    Internal,
}

impl DocumentErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentErrorCode::InvalidArgument => "documents/invalid-argument",
            DocumentErrorCode::NotFound => "documents/not-found",
            DocumentErrorCode::AlreadyExists => "documents/already-exists",
            DocumentErrorCode::PermissionDenied => "documents/permission-denied",
            DocumentErrorCode::Unavailable => "documents/unavailable",
            DocumentErrorCode::Cancelled => "documents/cancelled",
            DocumentErrorCode::DataLoss => "documents/data-loss",
            DocumentErrorCode::Internal => "documents/internal",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentError {
    pub code: DocumentErrorCode,
    message: String,
}

impl DocumentError {
    pub fn new(code: DocumentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// The message without the code suffix, suitable for user-facing alerts.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for DocumentError {}

pub type DocumentResult<T> = Result<T, DocumentError>;

pub fn invalid_argument(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::InvalidArgument, message)
}

pub fn not_found(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::NotFound, message)
}

pub fn already_exists(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::AlreadyExists, message)
}

pub fn permission_denied(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::PermissionDenied, message)
}

pub fn unavailable(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::Unavailable, message)
}

pub fn cancelled(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::Cancelled, message)
}

/// Stored data could not be decoded into the requested model.
pub fn data_loss(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::DataLoss, message)
}

pub fn internal_error(message: impl Into<String>) -> DocumentError {
    DocumentError::new(DocumentErrorCode::Internal, message)
}
