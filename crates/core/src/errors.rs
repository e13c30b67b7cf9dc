use std::time::Duration;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("item name is empty")]
    EmptyItemName,
}

/// Failures surfaced by a list backend. All of them are recoverable at the
/// handler level.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("backend response could not be decoded: {0}")]
    Decode(String),
    #[error("backend call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "The request could not be processed.",
            Self::Forbidden { .. } => "This skill does not accept requests from that application.",
            Self::ServiceUnavailable { .. } => {
                "The shopping list backend is temporarily unavailable."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Forbidden { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl BackendError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError::ServiceUnavailable {
            message: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::errors::{BackendError, InterfaceError};

    #[test]
    fn timeout_is_distinguished_from_other_failures() {
        assert!(BackendError::Timeout(Duration::from_secs(5)).is_timeout());
        assert!(!BackendError::Unavailable("connection refused".to_owned()).is_timeout());
    }

    #[test]
    fn timeout_message_reports_elapsed_budget() {
        let error = BackendError::Timeout(Duration::from_millis(1500));
        assert_eq!(error.to_string(), "backend call timed out after 1500ms");
    }

    #[test]
    fn backend_error_maps_to_service_unavailable_with_correlation() {
        let interface =
            BackendError::Rejected { status: 401, message: "unauthorized".to_owned() }
                .into_interface("req-1");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-1");
        assert_eq!(
            interface.user_message(),
            "The shopping list backend is temporarily unavailable."
        );
    }

    #[test]
    fn forbidden_has_user_safe_message() {
        let interface = InterfaceError::Forbidden {
            message: "application id mismatch".to_owned(),
            correlation_id: "req-2".to_owned(),
        };
        assert!(!interface.user_message().contains("mismatch"));
    }
}
