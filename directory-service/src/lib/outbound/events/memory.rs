use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::sync::OnceCell;

use super::consumer::BrokerConnector;
use super::consumer::MessageSource;
use super::consumer::TransportError;
use super::topology::Topology;
use crate::domain::events::errors::EventPublisherError;
use crate::domain::events::models::Delivery;
use crate::domain::events::models::DeliveryTag;
use crate::domain::events::ports::EventPublisher;

/// Message counts of one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub ready: usize,
    pub unacked: usize,
    pub dead_lettered: usize,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Delivery>,
    /// Delivered but not yet settled, keyed by tag with the owning session
    unacked: HashMap<DeliveryTag, (u64, Delivery)>,
    dead_letters: Vec<Delivery>,
}

impl QueueState {
    fn requeue_front(&mut self, mut deliveries: Vec<Delivery>) {
        deliveries.sort_by_key(|delivery| delivery.tag.offset);
        for mut delivery in deliveries.into_iter().rev() {
            delivery.redelivered = true;
            self.ready.push_front(delivery);
        }
    }

    fn take_unacked(&mut self, session: Option<u64>) -> Vec<Delivery> {
        let tags: Vec<DeliveryTag> = self
            .unacked
            .iter()
            .filter(|(_, (owner, _))| session.map_or(true, |session| *owner == session))
            .map(|(tag, _)| *tag)
            .collect();

        tags.into_iter()
            .filter_map(|tag| self.unacked.remove(&tag))
            .map(|(_, delivery)| delivery)
            .collect()
    }
}

struct BrokerState {
    exchanges: HashSet<String>,
    queues: HashMap<String, QueueState>,
    /// (exchange, queue, routing key)
    bindings: HashSet<(String, String, String)>,
    next_offset: i64,
    next_session: u64,
    available: bool,
    /// Bumped on every outage; sessions from an older epoch are dead
    epoch: u64,
}

/// In-process broker with direct-exchange routing and manual acknowledgement.
///
/// Used for local mode and tests. Mirrors the broker guarantees the consumer
/// relies on: a delivery stays owned by the broker until acknowledged, and
/// unsettled deliveries are redelivered when their session goes away.
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
    notify: Notify,
}

impl InMemoryBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BrokerState {
                exchanges: HashSet::new(),
                queues: HashMap::new(),
                bindings: HashSet::new(),
                next_offset: 0,
                next_session: 0,
                available: true,
                epoch: 0,
            }),
            notify: Notify::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declare exchange, queue and binding. Idempotent.
    ///
    /// # Errors
    /// * `ConnectionFailed` - Broker is unavailable
    pub fn declare(&self, topology: &Topology) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.available {
            return Err(TransportError::ConnectionFailed(
                "broker unavailable".to_string(),
            ));
        }

        state.exchanges.insert(topology.exchange.clone());
        state.queues.entry(topology.queue.clone()).or_default();
        state.bindings.insert((
            topology.exchange.clone(),
            topology.queue.clone(),
            topology.routing_key.clone(),
        ));

        Ok(())
    }

    /// Route a message to every queue bound to `exchange` with `routing_key`.
    ///
    /// # Returns
    /// Number of queues the message was routed to
    ///
    /// # Errors
    /// * `ConnectionFailed` - Broker is unavailable
    /// * `TopologyFailed` - Exchange was never declared
    pub fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<usize, TransportError> {
        let mut state = self.lock();
        if !state.available {
            return Err(TransportError::ConnectionFailed(
                "broker unavailable".to_string(),
            ));
        }
        if !state.exchanges.contains(exchange) {
            return Err(TransportError::TopologyFailed(format!(
                "exchange '{}' not declared",
                exchange
            )));
        }

        let targets: Vec<String> = state
            .bindings
            .iter()
            .filter(|(bound_exchange, _, bound_key)| {
                bound_exchange == exchange && bound_key == routing_key
            })
            .map(|(_, queue, _)| queue.clone())
            .collect();

        for queue in &targets {
            let offset = state.next_offset;
            state.next_offset += 1;

            if let Some(queue) = state.queues.get_mut(queue) {
                queue.ready.push_back(Delivery {
                    routing_key: routing_key.to_string(),
                    payload: payload.to_vec(),
                    tag: DeliveryTag {
                        partition: 0,
                        offset,
                    },
                    redelivered: false,
                });
            }
        }
        drop(state);

        if targets.is_empty() {
            tracing::debug!(exchange, routing_key, "Dropping unroutable message");
        }
        self.notify.notify_waiters();

        Ok(targets.len())
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    ///
    /// Going down kills every open session and puts their unacknowledged
    /// deliveries back at the head of their queues.
    pub fn set_available(&self, available: bool) {
        let mut state = self.lock();
        if state.available && !available {
            state.epoch += 1;
            for queue in state.queues.values_mut() {
                let unacked = queue.take_unacked(None);
                queue.requeue_front(unacked);
            }
        }
        state.available = available;
        drop(state);

        self.notify.notify_waiters();
    }

    pub fn queue_stats(&self, queue: &str) -> QueueStats {
        self.lock()
            .queues
            .get(queue)
            .map(|queue| QueueStats {
                ready: queue.ready.len(),
                unacked: queue.unacked.len(),
                dead_lettered: queue.dead_letters.len(),
            })
            .unwrap_or_default()
    }

    pub fn dead_letters(&self, queue: &str) -> Vec<Delivery> {
        self.lock()
            .queues
            .get(queue)
            .map(|queue| queue.dead_letters.clone())
            .unwrap_or_default()
    }

    fn open_session(&self, topology: &Topology) -> Result<(u64, u64), TransportError> {
        self.declare(topology)?;

        let mut state = self.lock();
        state.next_session += 1;
        Ok((state.next_session, state.epoch))
    }
}

/// Consumer session on an [`InMemoryBroker`] queue.
pub struct InMemorySource {
    broker: Arc<InMemoryBroker>,
    queue: String,
    session: u64,
    epoch: u64,
}

impl InMemorySource {
    fn ensure_alive(&self, state: &BrokerState) -> Result<(), TransportError> {
        if state.epoch != self.epoch || !state.available {
            return Err(TransportError::ConnectionLost(
                "broker connection closed".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSource for InMemorySource {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, TransportError> {
        loop {
            let notified = self.broker.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.broker.lock();
                self.ensure_alive(&state)?;

                let queue = state.queues.get_mut(&self.queue).ok_or_else(|| {
                    TransportError::TopologyFailed(format!("queue '{}' not declared", self.queue))
                })?;
                if let Some(delivery) = queue.ready.pop_front() {
                    queue
                        .unacked
                        .insert(delivery.tag, (self.session, delivery.clone()));
                    return Ok(Some(delivery));
                }
            }

            notified.await;
        }
    }

    async fn ack(&mut self, tag: DeliveryTag) -> Result<(), TransportError> {
        let mut state = self.broker.lock();
        self.ensure_alive(&state)?;

        let removed = state
            .queues
            .get_mut(&self.queue)
            .and_then(|queue| queue.unacked.remove(&tag));

        match removed {
            Some(_) => Ok(()),
            None => Err(TransportError::AckFailed(format!(
                "unknown delivery tag {}",
                tag.offset
            ))),
        }
    }

    async fn reject(&mut self, delivery: &Delivery, requeue: bool) -> Result<(), TransportError> {
        let mut state = self.broker.lock();
        self.ensure_alive(&state)?;

        let queue = state.queues.get_mut(&self.queue).ok_or_else(|| {
            TransportError::TopologyFailed(format!("queue '{}' not declared", self.queue))
        })?;
        let (_, rejected) = queue.unacked.remove(&delivery.tag).ok_or_else(|| {
            TransportError::AckFailed(format!("unknown delivery tag {}", delivery.tag.offset))
        })?;

        if requeue {
            queue.requeue_front(vec![rejected]);
        } else {
            queue.dead_letters.push(rejected);
        }
        drop(state);

        self.broker.notify.notify_waiters();
        Ok(())
    }
}

impl Drop for InMemorySource {
    fn drop(&mut self) {
        let mut state = self.broker.lock();
        if let Some(queue) = state.queues.get_mut(&self.queue) {
            let unacked = queue.take_unacked(Some(self.session));
            if !unacked.is_empty() {
                queue.requeue_front(unacked);
            }
        }
        drop(state);

        self.broker.notify.notify_waiters();
    }
}

/// Opens [`InMemorySource`] sessions on the configured queue.
pub struct InMemoryConnector {
    broker: Arc<InMemoryBroker>,
    topology: Topology,
}

impl InMemoryConnector {
    pub fn new(broker: Arc<InMemoryBroker>, topology: Topology) -> Self {
        Self { broker, topology }
    }
}

#[async_trait]
impl BrokerConnector for InMemoryConnector {
    type Source = InMemorySource;

    async fn connect(&self) -> Result<Self::Source, TransportError> {
        let (session, epoch) = self.broker.open_session(&self.topology)?;

        Ok(InMemorySource {
            broker: Arc::clone(&self.broker),
            queue: self.topology.queue.clone(),
            session,
            epoch,
        })
    }
}

/// Publisher for the in-memory broker. Declares the topology on first publish.
pub struct InMemoryEventPublisher {
    broker: Arc<InMemoryBroker>,
    topology: Topology,
    declared: OnceCell<()>,
}

impl InMemoryEventPublisher {
    pub fn new(broker: Arc<InMemoryBroker>, topology: Topology) -> Self {
        Self {
            broker,
            topology,
            declared: OnceCell::new(),
        }
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, message: &[u8], routing_key: &str) -> Result<(), EventPublisherError> {
        self.declared
            .get_or_try_init(|| async {
                self.broker
                    .declare(&self.topology)
                    .map_err(|e| EventPublisherError::TopologyFailed(e.to_string()))
            })
            .await?;

        let routed = self
            .broker
            .publish(&self.topology.exchange, routing_key, message)
            .map_err(|e| match e {
                TransportError::ConnectionFailed(msg) => EventPublisherError::ConnectionFailed(msg),
                other => EventPublisherError::PublishFailed(other.to_string()),
            })?;

        tracing::debug!(
            exchange = %self.topology.exchange,
            routing_key,
            routed,
            "Event published"
        );

        Ok(())
    }
}
