//! Batch delivery transports for streamsim.
//!
//! The engine talks to exactly one downstream capability: a
//! [`DeliveryTransport`] that accepts a batch of serialized payloads and
//! reports success, a transient failure, or a fatal failure. The concrete
//! production transport is Kafka ([`KafkaTransport`]); tests inject a
//! scriptable [`MockTransport`] through the same seam.

pub mod error;
pub mod kafka;
pub mod mock;

use async_trait::async_trait;

pub use error::DeliveryError;
pub use kafka::KafkaTransport;
pub use mock::{MockTransport, ScriptedOutcome};

/// Downstream ingestion endpoint seam.
///
/// Implementations own their connection state and are shared across workers
/// behind an `Arc`; `send_batch` must be safe to call concurrently.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Deliver one batch of serialized payloads as a single unit.
    ///
    /// A transient error means the same batch may be retried; a fatal error
    /// invalidates the whole run.
    async fn send_batch(&self, payloads: &[String]) -> Result<(), DeliveryError>;
}
