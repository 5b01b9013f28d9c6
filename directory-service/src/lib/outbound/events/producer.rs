use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use tokio::sync::OnceCell;

use super::kafka::declare_topology;
use super::topology::Topology;
use crate::domain::events::errors::EventPublisherError;
use crate::domain::events::ports::EventPublisher;

/// Long-lived Kafka producer for directory events.
///
/// The exchange topic is declared once, on the first publish.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    brokers: String,
    topology: Topology,
    timeout: Duration,
    declared: OnceCell<()>,
}

impl KafkaEventPublisher {
    /// Create a new Kafka event publisher with "at least once" delivery semantics
    ///
    /// # Arguments
    /// * `brokers` - Bootstrap servers
    /// * `topology` - Exchange topic to publish to
    /// * `timeout` - Bound on a single publish
    ///
    /// # Notes:
    /// - `acks=all`: Wait for all in-sync replicas to acknowledge
    /// - `enable.idempotence=true`: Prevents duplicate messages during retries
    /// - `retry.backoff.ms=100`: Backoff between retry attempts
    pub fn new(
        brokers: &str,
        topology: Topology,
        timeout: Duration,
    ) -> Result<Self, EventPublisherError> {
        tracing::info!(
            brokers,
            topic = %topology.exchange,
            "Initializing Kafka producer for directory events"
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("queue.buffering.max.messages", "10000")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("retries", "10")
            .set("max.in.flight.requests.per.connection", "5")
            .set("retry.backoff.ms", "100")
            .create()
            .map_err(|e| EventPublisherError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            producer,
            brokers: brokers.to_string(),
            topology,
            timeout,
            declared: OnceCell::new(),
        })
    }
}

fn publish_error(error: KafkaError) -> EventPublisherError {
    match error {
        KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut) => {
            EventPublisherError::Timeout(error.to_string())
        }
        KafkaError::MessageProduction(RDKafkaErrorCode::AllBrokersDown) => {
            EventPublisherError::ConnectionFailed(error.to_string())
        }
        other => EventPublisherError::PublishFailed(other.to_string()),
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, message: &[u8], routing_key: &str) -> Result<(), EventPublisherError> {
        self.declared
            .get_or_try_init(|| async {
                declare_topology(&self.brokers, &self.topology)
                    .await
                    .map_err(|e| EventPublisherError::TopologyFailed(e.to_string()))
            })
            .await?;

        let record = FutureRecord::to(&self.topology.exchange)
            .key(routing_key)
            .payload(message);

        let (partition, offset) = self
            .producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map_err(|(e, _)| {
                tracing::error!(error = %e, "Failed to publish event to Kafka after all retries");
                publish_error(e)
            })?;

        tracing::debug!(
            topic = %self.topology.exchange,
            routing_key,
            partition,
            offset,
            "Event published"
        );

        Ok(())
    }
}
