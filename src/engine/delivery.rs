//! Retrying batch delivery client.

use std::sync::Arc;
use std::time::Duration;
use streamsim_transport::{DeliveryError, DeliveryTransport};
use tracing::{debug, warn};

/// Final outcome of one batch after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The whole batch was acknowledged downstream.
    Sent,
    /// Transient failures exhausted the retry budget; the batch is lost.
    Dropped,
}

/// Wraps a transport with the retry policy.
///
/// A batch gets one initial attempt plus up to `retry_attempts` retries with
/// a fixed delay between attempts. Transient exhaustion drops the batch and
/// lets the worker carry on; a fatal error aborts immediately without
/// retrying.
pub struct DeliveryClient {
    transport: Arc<dyn DeliveryTransport>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl DeliveryClient {
    pub fn new(
        transport: Arc<dyn DeliveryTransport>,
        retry_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            transport,
            retry_attempts,
            retry_delay,
        }
    }

    /// Deliver one batch, retrying transient failures.
    ///
    /// Returns `Err` only for fatal delivery errors.
    pub async fn deliver(&self, payloads: &[String]) -> Result<BatchOutcome, DeliveryError> {
        let mut attempt = 0;
        loop {
            match self.transport.send_batch(payloads).await {
                Ok(()) => return Ok(BatchOutcome::Sent),
                Err(DeliveryError::Transient(reason)) => {
                    if attempt >= self.retry_attempts {
                        warn!(
                            count = payloads.len(),
                            attempts = attempt + 1,
                            %reason,
                            "dropping batch after exhausting retries"
                        );
                        return Ok(BatchOutcome::Dropped);
                    }
                    attempt += 1;
                    debug!(attempt, %reason, "transient delivery failure, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err @ DeliveryError::Fatal(_)) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamsim_transport::{MockTransport, ScriptedOutcome};

    fn batch(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{{\"n\":{i}}}")).collect()
    }

    fn client(transport: Arc<MockTransport>, retries: u32) -> DeliveryClient {
        DeliveryClient::new(transport, retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_clean_send() {
        let transport = Arc::new(MockTransport::always_ok());
        let outcome = client(transport.clone(), 3).deliver(&batch(5)).await.unwrap();

        assert_eq!(outcome, BatchOutcome::Sent);
        assert_eq!(transport.delivered(), 5);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_within_budget_recover() {
        let transport = Arc::new(MockTransport::with_script(vec![
            ScriptedOutcome::Transient("throttled".to_string()),
            ScriptedOutcome::Transient("throttled".to_string()),
            ScriptedOutcome::Ok,
        ]));
        let outcome = client(transport.clone(), 3).deliver(&batch(4)).await.unwrap();

        assert_eq!(outcome, BatchOutcome::Sent);
        // Delivered once, never double-counted across attempts.
        assert_eq!(transport.delivered(), 4);
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_drop_the_batch() {
        let transport = Arc::new(MockTransport::with_script(vec![
            ScriptedOutcome::Transient("down".to_string()),
            ScriptedOutcome::Transient("down".to_string()),
            ScriptedOutcome::Transient("down".to_string()),
        ]));
        let outcome = client(transport.clone(), 2).deliver(&batch(4)).await.unwrap();

        assert_eq!(outcome, BatchOutcome::Dropped);
        // Initial attempt plus two retries.
        assert_eq!(transport.attempts(), 3);
        assert_eq!(transport.delivered(), 0);
    }

    #[tokio::test]
    async fn test_fatal_error_skips_retries() {
        let transport = Arc::new(MockTransport::with_script(vec![ScriptedOutcome::Fatal(
            "bad creds".to_string(),
        )]));
        let err = client(transport.clone(), 5).deliver(&batch(1)).await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(transport.attempts(), 1);
    }
}
