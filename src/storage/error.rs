use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageErrorCode {
    Unknown,
    InvalidArgument,
    InvalidRootOperation,
    ObjectNotFound,
    Canceled,
    Unavailable,
    InternalError,
    NoDownloadUrl,
}

impl StorageErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageErrorCode::Unknown => "storage/unknown",
            StorageErrorCode::InvalidArgument => "storage/invalid-argument",
            StorageErrorCode::InvalidRootOperation => "storage/invalid-root-operation",
            StorageErrorCode::ObjectNotFound => "storage/object-not-found",
            StorageErrorCode::Canceled => "storage/canceled",
            StorageErrorCode::Unavailable => "storage/unavailable",
            StorageErrorCode::InternalError => "storage/internal-error",
            StorageErrorCode::NoDownloadUrl => "storage/no-download-url",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageError {
    pub code: StorageErrorCode,
    message: String,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for StorageError {}

pub type StorageResult<T> = Result<T, StorageError>;

pub fn unknown_error() -> StorageError {
    StorageError::new(
        StorageErrorCode::Unknown,
        "An unknown error occurred; check the error payload for details.",
    )
}

pub fn invalid_argument(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::InvalidArgument, message)
}

pub fn invalid_root_operation(operation: &str) -> StorageError {
    StorageError::new(
        StorageErrorCode::InvalidRootOperation,
        format!("'{operation}' cannot be performed on the storage root reference."),
    )
}

pub fn object_not_found(path: &str) -> StorageError {
    StorageError::new(
        StorageErrorCode::ObjectNotFound,
        format!("Object '{path}' does not exist."),
    )
}

pub fn canceled() -> StorageError {
    StorageError::new(StorageErrorCode::Canceled, "User canceled the upload.")
}

pub fn unavailable(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::Unavailable, message)
}

pub fn internal_error(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::InternalError, message)
}

pub fn no_download_url() -> StorageError {
    StorageError::new(
        StorageErrorCode::NoDownloadUrl,
        "The requested object does not expose a download URL.",
    )
}
