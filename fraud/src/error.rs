//! Error types for the fraud prevention service

use hyper::StatusCode;
use thiserror::Error;

use crate::engine::entry::OrderId;

/// Message returned to clients for any server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing the request.";

/// Result type for fraud checks
pub type FraudResult<T> = Result<T, FraudError>;

#[derive(Debug, Error)]
pub enum FraudError {
    /// Batch is too small to compare
    #[error("At least {min} orders are required for comparison.")]
    NotEnoughPurchases { min: usize, actual: usize },

    /// Request carried no purchase collection
    #[error("At least 2 orders are required for comparison.")]
    MissingPurchases,

    /// Batch exceeds the configured limit
    #[error("At most {max} orders can be compared in one request, got {actual}.")]
    BatchTooLarge { max: usize, actual: usize },

    /// Request body exceeds the configured size
    #[error("Request body exceeds {max} bytes.")]
    BodyTooLarge { max: usize },

    /// Request body is not a valid purchase batch
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Email address without a local part separator
    #[error("Order {order_id} has a malformed email address: {email:?}")]
    MalformedEmail { order_id: OrderId, email: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FraudError {
    /// Whether the requester is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FraudError::NotEnoughPurchases { .. }
                | FraudError::MissingPurchases
                | FraudError::BatchTooLarge { .. }
                | FraudError::BodyTooLarge { .. }
                | FraudError::InvalidBody(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        if let FraudError::BodyTooLarge { .. } = self {
            StatusCode::PAYLOAD_TOO_LARGE
        } else if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Message safe to return to the requester. Server errors never leak detail.
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        }
    }

    /// Short label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            FraudError::NotEnoughPurchases { .. } => "not_enough_purchases",
            FraudError::MissingPurchases => "missing_purchases",
            FraudError::BatchTooLarge { .. } => "batch_too_large",
            FraudError::BodyTooLarge { .. } => "body_too_large",
            FraudError::InvalidBody(_) => "invalid_body",
            FraudError::MalformedEmail { .. } => "malformed_email",
            FraudError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for FraudError {
    fn from(e: serde_json::Error) -> Self {
        FraudError::InvalidBody(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        let e = FraudError::NotEnoughPurchases { min: 2, actual: 1 };
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            e.public_message(),
            "At least 2 orders are required for comparison."
        );
        assert_eq!(
            FraudError::MissingPurchases.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_oversized_body_is_payload_too_large() {
        let e = FraudError::BodyTooLarge { max: 16 };
        assert!(e.is_client_error());
        assert_eq!(e.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(e.public_message(), "Request body exceeds 16 bytes.");
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let e = FraudError::MalformedEmail {
            order_id: 4,
            email: "secret-but-broken".to_string(),
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.public_message(), INTERNAL_ERROR_MESSAGE);
        assert!(e.to_string().contains("secret-but-broken"));
    }
}
