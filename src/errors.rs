use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of remote calls and store configuration. A missing session is
/// not an error: store operations report it as a `NoSession` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("notification service rejected request ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    ServiceRejected {
        status: u16,
        message: Option<String>,
    },

    #[error("malformed service response: {0}")]
    Decode(String),

    #[error("polling interval must be greater than zero")]
    InvalidInterval,
}

/// Serialisable classification of the last failure, kept in store state
/// for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkFailure,
    ServiceRejected,
    Decode,
    InvalidInterval,
}

impl NotifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotifyError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            NotifyError::ServiceRejected { .. } => ErrorKind::ServiceRejected,
            NotifyError::Decode(_) => ErrorKind::Decode,
            NotifyError::InvalidInterval => ErrorKind::InvalidInterval,
        }
    }

    /// Short, user-facing text for toasts.
    pub fn user_message(&self) -> String {
        match self {
            NotifyError::NetworkFailure(_) => {
                "Could not reach the notification service".to_string()
            }
            NotifyError::ServiceRejected {
                message: Some(m), ..
            } => m.clone(),
            NotifyError::ServiceRejected { status, .. } => {
                format!("Notification service returned an error ({})", status)
            }
            NotifyError::Decode(_) => "Received an unreadable response".to_string(),
            NotifyError::InvalidInterval => "Invalid polling interval".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            NotifyError::NetworkFailure("reset".into()).kind(),
            ErrorKind::NetworkFailure
        );
        assert_eq!(
            NotifyError::ServiceRejected { status: 500, message: None }.kind(),
            ErrorKind::ServiceRejected
        );
    }

    #[test]
    fn test_rejected_display_includes_message() {
        let err = NotifyError::ServiceRejected {
            status: 403,
            message: Some("forbidden".into()),
        };
        assert_eq!(
            err.to_string(),
            "notification service rejected request (403): forbidden"
        );
        assert_eq!(err.user_message(), "forbidden");
    }

    #[test]
    fn test_every_kind_has_user_message() {
        let errors = [
            NotifyError::NetworkFailure("reset".into()),
            NotifyError::ServiceRejected { status: 500, message: None },
            NotifyError::Decode("eof".into()),
            NotifyError::InvalidInterval,
        ];
        for err in errors {
            assert!(!err.user_message().is_empty(), "{:?}", err.kind());
        }
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NetworkFailure).unwrap();
        assert_eq!(json, "\"network_failure\"");
    }
}
