use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use splitpay_engine::SplitPaymentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The database is busy. Please try again. {0}")]
    BackendBusy(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The payment gateway failed. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<SplitPaymentError> for ServerError {
    fn from(e: SplitPaymentError) -> Self {
        match e {
            SplitPaymentError::ValidationError(_) => Self::InvalidRequestBody(e.to_string()),
            SplitPaymentError::CoPaymentNotFound(_) |
            SplitPaymentError::CoPaymentForOrderNotFound(_) |
            SplitPaymentError::ContributorNotFound(_) |
            SplitPaymentError::PaymentLinkNotFound(_) => Self::NoRecordFound(e.to_string()),
            SplitPaymentError::CoPaymentAlreadyExists(_) | SplitPaymentError::IllegalTransition(_) => {
                Self::Conflict(e.to_string())
            },
            SplitPaymentError::UpstreamGatewayError(_) => Self::UpstreamError(e.to_string()),
            SplitPaymentError::TransientDatabaseError(_) => Self::BackendBusy(e.to_string()),
            SplitPaymentError::ConsistencyWarning { .. } |
            SplitPaymentError::InvalidSnapshot(_) |
            SplitPaymentError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
