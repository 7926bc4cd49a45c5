use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use template_market_engine::SettlementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state of the record. {0}")]
    Conflict(String),
    #[error("The gateway event is inconsistent with our records. {0}")]
    InconsistentGatewayEvent(String),
    #[error("The payment gateway could not process the request. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingPrincipal => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedPrincipal(_) => StatusCode::BAD_REQUEST,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InconsistentGatewayEvent(_) => StatusCode::BAD_REQUEST,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No authenticated principal was forwarded with the request.")]
    MissingPrincipal,
    #[error("The forwarded principal is not in the correct format. {0}")]
    PoorlyFormattedPrincipal(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Webhook signature invalid or not provided.")]
    InvalidSignature,
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            SettlementError::TemplateNotFound(_)
            | SettlementError::OrderNotFound(_)
            | SettlementError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettlementError::TemplateAlreadyPurchased(_)
            | SettlementError::OrderAlreadyProcessed(_)
            | SettlementError::OrderAlreadyRefunded(_)
            | SettlementError::PaymentAlreadyFinalized(_)
            | SettlementError::PaymentNotRefundable(_) => Self::Conflict(e.to_string()),
            SettlementError::AmountMismatch { .. } | SettlementError::CurrencyMismatch { .. } => {
                // Alerting-worthy: a gateway event disagreed with our ledger.
                error!("🚨️ {e}");
                Self::InconsistentGatewayEvent(e.to_string())
            },
            SettlementError::GatewayError(e) => Self::GatewayUnavailable(e),
        }
    }
}
