use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use rdkafka::admin::AdminClient;
use rdkafka::admin::AdminOptions;
use rdkafka::admin::NewTopic;
use rdkafka::admin::TopicReplication;
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::CommitMode;
use rdkafka::consumer::Consumer;
use rdkafka::consumer::StreamConsumer;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use rdkafka::Message;
use rdkafka::Offset;
use rdkafka::TopicPartitionList;

use super::consumer::BrokerConnector;
use super::consumer::MessageSource;
use super::consumer::TransportError;
use super::topology::Topology;
use crate::domain::events::models::Delivery;
use crate::domain::events::models::DeliveryTag;

/// Create the exchange topic and its dead-letter topic if they are missing.
///
/// # Errors
/// * `ConnectionFailed` - Admin client could not be created
/// * `TopologyFailed` - Broker refused to create a topic
pub async fn declare_topology(brokers: &str, topology: &Topology) -> Result<(), TransportError> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .create()
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

    let dead_letter_topic = topology.dead_letter_topic();
    let topics = [
        NewTopic::new(&topology.exchange, 1, TopicReplication::Fixed(1)),
        NewTopic::new(&dead_letter_topic, 1, TopicReplication::Fixed(1)),
    ];

    let results = admin
        .create_topics(&topics, &AdminOptions::new())
        .await
        .map_err(|e| TransportError::TopologyFailed(e.to_string()))?;

    for result in results {
        match result {
            Ok(topic) => tracing::info!(topic = %topic, "Created Kafka topic"),
            Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => {}
            Err((topic, code)) => {
                return Err(TransportError::TopologyFailed(format!(
                    "failed to create topic '{}': {}",
                    topic, code
                )))
            }
        }
    }

    Ok(())
}

/// Opens Kafka consumer sessions.
///
/// The queue maps to the consumer group and the exchange to the topic. Offsets
/// are committed manually, one past each acknowledged message.
pub struct KafkaConnector {
    brokers: String,
    topology: Topology,
    timeout: Duration,
}

impl KafkaConnector {
    /// # Arguments
    /// * `brokers` - Bootstrap servers
    /// * `topology` - Topic, consumer group and routing key
    /// * `timeout` - Bound on dead-letter produce and seek calls
    pub fn new(brokers: &str, topology: Topology, timeout: Duration) -> Self {
        Self {
            brokers: brokers.to_string(),
            topology,
            timeout,
        }
    }
}

#[async_trait]
impl BrokerConnector for KafkaConnector {
    type Source = KafkaSource;

    async fn connect(&self) -> Result<Self::Source, TransportError> {
        declare_topology(&self.brokers, &self.topology).await?;

        tracing::info!(
            brokers = %self.brokers,
            topic = %self.topology.exchange,
            group_id = %self.topology.queue,
            "Connecting Kafka consumer"
        );

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.topology.queue)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        consumer
            .subscribe(&[self.topology.exchange.as_str()])
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let dead_letter_producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("message.timeout.ms", "30000")
            .set("acks", "all")
            .create()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(KafkaSource {
            consumer,
            dead_letter_producer,
            topology: self.topology.clone(),
            timeout: self.timeout,
            requeued: HashSet::new(),
        })
    }
}

/// One Kafka consumer session.
///
/// Dropping it closes the consumer; uncommitted offsets are consumed again by
/// the next session of the group.
pub struct KafkaSource {
    consumer: StreamConsumer,
    dead_letter_producer: FutureProducer,
    topology: Topology,
    timeout: Duration,
    /// Offsets rewound by a requeue, reported as redelivered when seen again
    requeued: HashSet<DeliveryTag>,
}

impl KafkaSource {
    fn commit(&self, tag: DeliveryTag) -> Result<(), TransportError> {
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(
                &self.topology.exchange,
                tag.partition,
                Offset::Offset(tag.offset + 1),
            )
            .map_err(|e| TransportError::AckFailed(e.to_string()))?;

        self.consumer
            .commit(&offsets, CommitMode::Async)
            .map_err(|e| TransportError::AckFailed(e.to_string()))
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, TransportError> {
        let mut delivery = {
            let Some(next) = self.consumer.stream().next().await else {
                return Ok(None);
            };
            let message = next.map_err(|e| TransportError::ConnectionLost(e.to_string()))?;

            Delivery {
                routing_key: message
                    .key()
                    .map(|key| String::from_utf8_lossy(key).into_owned())
                    .unwrap_or_default(),
                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                tag: DeliveryTag {
                    partition: message.partition(),
                    offset: message.offset(),
                },
                redelivered: false,
            }
        };

        delivery.redelivered = self.requeued.remove(&delivery.tag);

        Ok(Some(delivery))
    }

    async fn ack(&mut self, tag: DeliveryTag) -> Result<(), TransportError> {
        self.commit(tag)
    }

    async fn reject(&mut self, delivery: &Delivery, requeue: bool) -> Result<(), TransportError> {
        if requeue {
            self.consumer
                .seek(
                    &self.topology.exchange,
                    delivery.tag.partition,
                    Offset::Offset(delivery.tag.offset),
                    Timeout::After(self.timeout),
                )
                .map_err(|e| TransportError::AckFailed(e.to_string()))?;
            self.requeued.insert(delivery.tag);
            return Ok(());
        }

        let dead_letter_topic = self.topology.dead_letter_topic();
        let record = FutureRecord::to(&dead_letter_topic)
            .key(delivery.routing_key.as_str())
            .payload(delivery.payload.as_slice());

        self.dead_letter_producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map_err(|(e, _)| TransportError::AckFailed(format!("dead-letter failed: {}", e)))?;

        tracing::warn!(
            topic = %dead_letter_topic,
            partition = delivery.tag.partition,
            offset = delivery.tag.offset,
            "Delivery moved to dead-letter topic"
        );

        self.commit(delivery.tag)
    }
}
