//! Mapping from domain errors to HTTP responses
//!
//! Every failure leaves the server as the standard [`ApiResponse`] error
//! envelope; the status code is chosen from the domain error kind.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use std::fmt;
use sv_core::errors::{DomainError, LedgerError, ProviderError, VerificationError};
use sv_shared::{ApiResponse, ErrorResponse};

/// Domain error carried out of a handler
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(DomainError::Validation {
            message: message.into(),
        })
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self(DomainError::NotFound {
            resource: resource.into(),
        })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(errors.to_string())
    }
}

/// HTTP status for a domain error
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden { .. } => StatusCode::FORBIDDEN,
        DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,

        DomainError::Ledger(e) => match e {
            LedgerError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            LedgerError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
        },

        DomainError::Verification(e) => match e {
            VerificationError::NotFound { .. } => StatusCode::NOT_FOUND,
            VerificationError::DuplicateId { .. } => StatusCode::CONFLICT,
            VerificationError::InvalidTransition { .. } => StatusCode::CONFLICT,
        },

        DomainError::Provider(e) => match e {
            ProviderError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProviderError::NoNumbersAvailable { .. } => StatusCode::CONFLICT,
            ProviderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProviderError::Error(_) => StatusCode::BAD_GATEWAY,
        },
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(&self.0)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.0.error_code(), "Request rejected");
        }

        HttpResponse::build(status).json(ApiResponse::<()>::error(ErrorResponse::from(self.0.clone())))
    }
}

/// Malformed or oversized JSON bodies
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(format!("Invalid request body: {}", err)).into()
}

/// Unparseable query strings
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(format!("Invalid query string: {}", err)).into()
}

/// Path segments that do not parse (e.g. a malformed verification ID)
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Unparseable path parameter");
    ApiError::not_found("verification").into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_core::domain::entities::verification::VerificationStatus;
    use sv_core::domain::value_objects::Money;
    use uuid::Uuid;

    #[test]
    fn test_ledger_statuses() {
        let insufficient = DomainError::Ledger(LedgerError::InsufficientFunds {
            required: Money::from_cents(150).unwrap(),
            available: Money::zero(),
        });
        assert_eq!(status_for(&insufficient), StatusCode::PAYMENT_REQUIRED);

        let missing = DomainError::Ledger(LedgerError::UserNotFound {
            user_id: Uuid::new_v4(),
        });
        assert_eq!(status_for(&missing), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_provider_statuses() {
        let unavailable = DomainError::Provider(ProviderError::Unavailable {
            message: "down".to_string(),
        });
        assert_eq!(status_for(&unavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&DomainError::Provider(ProviderError::Timeout)),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&DomainError::Provider(ProviderError::NoNumbersAvailable {
                service: "whatsapp".to_string(),
                country: "US".to_string(),
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let error = DomainError::Verification(VerificationError::InvalidTransition {
            from: VerificationStatus::Completed,
            to: VerificationStatus::Cancelled,
        });
        assert_eq!(ApiError(error).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let response = ApiError(DomainError::internal("pool exhausted")).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
