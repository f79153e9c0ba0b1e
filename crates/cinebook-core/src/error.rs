//! Unified application error types for Cinebook.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The booking-facing kinds
//! (`Validation`, `NotFound`, `Conflict`, `Payment`, `Persistence`,
//! `Policy`) are what callers of the booking flow branch on.

use std::fmt;
use thiserror::Error;

/// `refund_status` when a compensating refund was queued.
pub const REFUND_IN_PROGRESS: &str = "in_progress";
/// `refund_status` when the refund could not even be queued.
pub const REFUND_MANUAL_REVIEW: &str = "manual_review";

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Malformed input, rejected before any lock or charge attempt.
    Validation,
    /// The show or booking does not exist.
    NotFound,
    /// A seat is already booked or its lock is held by someone else.
    Conflict,
    /// The charge did not succeed (declined, timed out, or circuit open).
    Payment,
    /// The booking transaction failed after a successful charge.
    Persistence,
    /// A business rule forbids the operation (e.g. late cancellation).
    Policy,
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller lacks the required role.
    Forbidden,
    /// A rate limit was exceeded.
    RateLimited,
    /// A downstream dependency is temporarily unavailable.
    ServiceUnavailable,
    /// A database error occurred.
    Database,
    /// A lock store error occurred.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Payment => write!(f, "PAYMENT"),
            Self::Persistence => write!(f, "PERSISTENCE"),
            Self::Policy => write!(f, "POLICY"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Cinebook.
///
/// `details` carries structured, client-visible context such as the
/// `payment_id` of a charge that must be refunded.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional structured details returned to the client.
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach structured details to this error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a payment error.
    pub fn payment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Payment, message)
    }

    /// Create a policy error.
    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Policy, message)
    }

    /// Create the error reported when a booking could not be persisted
    /// after its charge went through. The payment id travels with it so
    /// the client can correlate the refund; `refund_queued` says whether a
    /// refund is actually on its way or needs an operator.
    pub fn persistence_after_charge(
        payment_id: &str,
        amount: i64,
        refund_queued: bool,
        cause: impl Into<String>,
    ) -> Self {
        let (status, outlook) = if refund_queued {
            (REFUND_IN_PROGRESS, "a refund is in progress")
        } else {
            (REFUND_MANUAL_REVIEW, "the refund needs manual review")
        };
        Self::new(
            ErrorKind::Persistence,
            format!(
                "Booking could not be saved after payment {payment_id} of {amount} was charged; {outlook}"
            ),
        )
        .with_details(serde_json::json!({
            "payment_id": payment_id,
            "amount": amount,
            "refund_status": status,
            "cause": cause.into(),
        }))
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a rate-limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a lock store error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the error is a server-side failure (not the caller's fault).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Persistence
                | ErrorKind::ServiceUnavailable
                | ErrorKind::Database
                | ErrorKind::Cache
                | ErrorKind::Configuration
                | ErrorKind::Serialization
                | ErrorKind::Internal
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            details: self.details.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
