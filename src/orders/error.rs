use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::documents::DocumentError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderErrorCode {
    InvalidPageSize,
    Backend,
}

impl OrderErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderErrorCode::InvalidPageSize => "orders/invalid-page-size",
            OrderErrorCode::Backend => "orders/backend",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderError {
    pub code: OrderErrorCode,
    message: String,
    cause: Option<&'static str>,
}

impl OrderError {
    pub fn new(code: OrderErrorCode, message: impl Into<String>) -> Self {
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

    pub fn cause_code(&self) -> Option<&'static str> {
        self.cause
    }

    pub fn alert_text(&self) -> String {
        format!("Error: {}", self.message)
    }
}

impl Display for OrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for OrderError {}

impl From<DocumentError> for OrderError {
    fn from(error: DocumentError) -> Self {
        Self {
            code: OrderErrorCode::Backend,
            message: error.message().to_string(),
            cause: Some(error.code_str()),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

pub fn invalid_page_size(size: usize) -> OrderError {
    OrderError::new(
        OrderErrorCode::InvalidPageSize,
        format!("Order page size must be positive, got {size}"),
    )
}
