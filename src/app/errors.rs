use std::fmt;

use crate::documents::DocumentError;
use crate::logger::LogError;
use crate::orders::OrderError;
use crate::products::ProductError;
use crate::storage::StorageError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    InvalidOptions { message: String },
    InvalidLogLevel { level: String },
}

impl AppError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::InvalidOptions { .. } => "app/invalid-options",
            AppError::InvalidLogLevel { .. } => "app/invalid-log-level",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidOptions { message } => {
                write!(f, "Invalid dashboard options: {message} ({})", self.code_str())
            }
            AppError::InvalidLogLevel { level } => {
                write!(f, "Invalid log level '{level}' ({})", self.code_str())
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<LogError> for AppError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::InvalidLogLevel(level) => AppError::InvalidLogLevel { level },
        }
    }
}

pub(crate) fn invalid_options(message: impl Into<String>) -> AppError {
    AppError::InvalidOptions {
        message: message.into(),
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Any failure surfaced by a [`Dashboard`](crate::app::Dashboard) action.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardError {
    App(AppError),
    Document(DocumentError),
    Storage(StorageError),
    Product(ProductError),
    Order(OrderError),
}

impl DashboardError {
    pub fn code_str(&self) -> &'static str {
        match self {
            DashboardError::App(err) => err.code_str(),
            DashboardError::Document(err) => err.code_str(),
            DashboardError::Storage(err) => err.code_str(),
            DashboardError::Product(err) => err.code_str(),
            DashboardError::Order(err) => err.code_str(),
        }
    }

    /// The alert text the operator sees: the fixed "Please fill all the fields"
    /// for incomplete forms, `"Error: {message}"` otherwise.
    pub fn alert_text(&self) -> String {
        match self {
            DashboardError::App(err) => format!("Error: {err}"),
            DashboardError::Document(err) => format!("Error: {}", err.message()),
            DashboardError::Storage(err) => format!("Error: {}", err.message()),
            DashboardError::Product(err) => err.alert_text(),
            DashboardError::Order(err) => err.alert_text(),
        }
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::App(err) => fmt::Display::fmt(err, f),
            DashboardError::Document(err) => fmt::Display::fmt(err, f),
            DashboardError::Storage(err) => fmt::Display::fmt(err, f),
            DashboardError::Product(err) => fmt::Display::fmt(err, f),
            DashboardError::Order(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::App(err) => Some(err),
            DashboardError::Document(err) => Some(err),
            DashboardError::Storage(err) => Some(err),
            DashboardError::Product(err) => Some(err),
            DashboardError::Order(err) => Some(err),
        }
    }
}

impl From<AppError> for DashboardError {
    fn from(err: AppError) -> Self {
        DashboardError::App(err)
    }
}

impl From<DocumentError> for DashboardError {
    fn from(err: DocumentError) -> Self {
        DashboardError::Document(err)
    }
}

impl From<StorageError> for DashboardError {
    fn from(err: StorageError) -> Self {
        DashboardError::Storage(err)
    }
}

impl From<ProductError> for DashboardError {
    fn from(err: ProductError) -> Self {
        DashboardError::Product(err)
    }
}

impl From<OrderError> for DashboardError {
    fn from(err: OrderError) -> Self {
        DashboardError::Order(err)
    }
}
