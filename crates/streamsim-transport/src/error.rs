//! Delivery error taxonomy.

use thiserror::Error;

/// Errors surfaced by a [`crate::DeliveryTransport`].
///
/// Transient failures (timeouts, throttling, broker queue pressure) are
/// retryable; fatal failures (authentication, authorization, endpoint
/// identity) invalidate the whole run and are never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Retryable failure; the same batch may be sent again.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// Non-retryable failure; terminates the run.
    #[error("fatal delivery failure: {0}")]
    Fatal(String),
}

impl DeliveryError {
    /// Whether this error invalidates the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeliveryError::Fatal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(DeliveryError::Fatal("bad credentials".to_string()).is_fatal());
        assert!(!DeliveryError::Transient("timed out".to_string()).is_fatal());
    }

    #[test]
    fn test_display_includes_cause() {
        let err = DeliveryError::Transient("queue full".to_string());
        assert_eq!(err.to_string(), "transient delivery failure: queue full");
    }
}
