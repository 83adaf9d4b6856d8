use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentLinkApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Invalid payment link request: {0}")]
    InvalidRequest(String),
}

impl PaymentLinkApiError {
    /// Server-side (5xx) and transport failures are worth retrying later. Client errors (4xx) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RestResponseError(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
