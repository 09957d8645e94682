//! Collaborator error types and handling

use thiserror::Error;

/// Failures reported by network-facing collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommError {
    /// Service could not be reached at all
    #[error("{service} unavailable")]
    Unavailable { service: String },
    /// No answer within the allowed time
    #[error("{service} timed out after {timeout_ms}ms")]
    Timeout { service: String, timeout_ms: u32 },
    /// Answer arrived but could not be used
    #[error("invalid response from {service}: {details}")]
    InvalidResponse { service: String, details: String },
    /// Service refused the request
    #[error("{service} rejected request ({status}): {reason}")]
    Rejected { service: String, status: u16, reason: String },
}

/// Result type for collaborator operations
pub type CommResult<T> = Result<T, CommError>;

impl CommError {
    /// Whether retrying the same request later can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            CommError::Unavailable { .. } | CommError::Timeout { .. } => true,
            CommError::InvalidResponse { .. } => false,
            CommError::Rejected { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(CommError::Unavailable { service: "backend".into() }.is_recoverable());
        assert!(CommError::Timeout { service: "backend".into(), timeout_ms: 500 }.is_recoverable());
        assert!(!CommError::InvalidResponse { service: "stats".into(), details: "bad".into() }.is_recoverable());
        assert!(CommError::Rejected { service: "backend".into(), status: 503, reason: "busy".into() }.is_recoverable());
        assert!(!CommError::Rejected { service: "backend".into(), status: 400, reason: "bad".into() }.is_recoverable());
    }

    #[test]
    fn test_display() {
        let error = CommError::Timeout { service: "stats".into(), timeout_ms: 250 };
        assert_eq!(error.to_string(), "stats timed out after 250ms");
    }
}
