//! Scriptable in-memory transport for tests.

use crate::error::DeliveryError;
use crate::DeliveryTransport;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Outcome script entry for [`MockTransport`].
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Ok,
    Transient(String),
    Fatal(String),
}

/// In-memory transport that replays a scripted sequence of outcomes.
///
/// Each `send_batch` call consumes one script entry; once the script is
/// exhausted every further call succeeds. An optional per-call latency
/// simulates send time.
pub struct MockTransport {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    delivered: AtomicU64,
    attempts: AtomicU64,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Transport that accepts every batch.
    pub fn always_ok() -> Self {
        Self::with_script(Vec::new())
    }

    /// Transport that replays `script`, then accepts every batch.
    pub fn with_script(script: Vec<ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            delivered: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            latency: None,
        }
    }

    /// Add a fixed latency to every send attempt.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Total messages accepted across all successful batches.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Total `send_batch` calls, including failed attempts.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DeliveryTransport for MockTransport {
    async fn send_batch(&self, payloads: &[String]) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = self
            .script
            .lock()
            .expect("mock transport script lock poisoned")
            .pop_front();

        match outcome {
            None | Some(ScriptedOutcome::Ok) => {
                self.delivered
                    .fetch_add(payloads.len() as u64, Ordering::Relaxed);
                Ok(())
            }
            Some(ScriptedOutcome::Transient(msg)) => Err(DeliveryError::Transient(msg)),
            Some(ScriptedOutcome::Fatal(msg)) => Err(DeliveryError::Fatal(msg)),
        }
    }
}
