//! Kafka delivery transport.

use crate::error::DeliveryError;
use crate::DeliveryTransport;
use async_trait::async_trait;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::debug;

/// Per-message delivery acknowledgement timeout.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Kafka transport built on a pooled `FutureProducer`.
///
/// The producer is created once and reused for every batch; workers share
/// the transport behind an `Arc` and rely on librdkafka's internal queueing
/// for concurrent sends.
pub struct KafkaTransport {
    producer: FutureProducer,
    topic: String,
}

impl KafkaTransport {
    /// Create a transport for the given brokers and topic.
    pub fn new(brokers: &str, topic: &str) -> Result<Self, DeliveryError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "30000")
            .set("queue.buffering.max.messages", "100000")
            .set("queue.buffering.max.kbytes", "1048576")
            .set("batch.size", "65536")
            .set("linger.ms", "5")
            .create()
            .map_err(|e| DeliveryError::Fatal(format!("failed to create producer: {e}")))?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl DeliveryTransport for KafkaTransport {
    async fn send_batch(&self, payloads: &[String]) -> Result<(), DeliveryError> {
        // Enqueue the whole batch before awaiting acknowledgements so
        // librdkafka can coalesce the messages into broker-side batches.
        let mut pending = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let record: FutureRecord<'_, (), String> =
                FutureRecord::to(&self.topic).payload(payload);
            pending.push(self.producer.send(record, SEND_TIMEOUT));
        }

        for delivery in pending {
            delivery.await.map_err(|(err, _)| classify(err))?;
        }

        debug!(count = payloads.len(), topic = %self.topic, "batch delivered");
        Ok(())
    }
}

/// Map a Kafka error onto the transient/fatal taxonomy.
///
/// Authentication, authorization and endpoint-identity failures invalidate
/// the run; everything else (timeouts, throttling, queue pressure, broker
/// transport hiccups) is retryable.
fn classify(err: KafkaError) -> DeliveryError {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::SaslAuthenticationFailed)
        | Some(RDKafkaErrorCode::Authentication)
        | Some(RDKafkaErrorCode::TopicAuthorizationFailed)
        | Some(RDKafkaErrorCode::GroupAuthorizationFailed)
        | Some(RDKafkaErrorCode::ClusterAuthorizationFailed)
        | Some(RDKafkaErrorCode::UnknownTopicOrPartition) => DeliveryError::Fatal(err.to_string()),
        _ => DeliveryError::Transient(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_pressure_is_transient() {
        let err = KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull);
        assert!(!classify(err).is_fatal());

        let err = KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut);
        assert!(!classify(err).is_fatal());
    }

    #[test]
    fn test_auth_failures_are_fatal() {
        let err = KafkaError::MessageProduction(RDKafkaErrorCode::SaslAuthenticationFailed);
        assert!(classify(err).is_fatal());

        let err = KafkaError::MessageProduction(RDKafkaErrorCode::TopicAuthorizationFailed);
        assert!(classify(err).is_fatal());
    }

    #[test]
    fn test_unknown_topic_is_fatal() {
        let err = KafkaError::MessageProduction(RDKafkaErrorCode::UnknownTopicOrPartition);
        assert!(classify(err).is_fatal());
    }
}
