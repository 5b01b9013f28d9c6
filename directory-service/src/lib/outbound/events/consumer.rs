use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::BrokerConfig;
use crate::domain::events::errors::HandlerError;
use crate::domain::events::models::Delivery;
use crate::domain::events::models::DeliveryTag;
use crate::domain::events::ports::NotificationHandler;

/// Broker transport failures seen by the consumer.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Failed to connect to broker: {0}")]
    ConnectionFailed(String),

    #[error("Broker connection lost: {0}")]
    ConnectionLost(String),

    #[error("Failed to settle delivery: {0}")]
    AckFailed(String),

    #[error("Failed to declare broker topology: {0}")]
    TopologyFailed(String),
}

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Gave up reconnecting after {attempts} attempts: {last_error}")]
    ReconnectAttemptsExhausted { attempts: u32, last_error: String },
}

/// Opens consumer sessions against a broker.
///
/// `connect` declares the exchange, queue and binding before returning, so a
/// fresh session always sees the same topology the publisher uses.
#[async_trait]
pub trait BrokerConnector: Send + Sync + 'static {
    type Source: MessageSource;

    async fn connect(&self) -> Result<Self::Source, TransportError>;
}

/// One consumer session. Deliveries not settled when the session is dropped
/// go back to the broker.
#[async_trait]
pub trait MessageSource: Send + 'static {
    /// Wait for the next delivery.
    ///
    /// Must be cancel safe: dropping the future loses no message.
    ///
    /// # Returns
    /// `None` when the broker closed the session
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, TransportError>;

    /// Acknowledge a delivery; the broker forgets it.
    async fn ack(&mut self, tag: DeliveryTag) -> Result<(), TransportError>;

    /// Negative-acknowledge a delivery.
    ///
    /// # Arguments
    /// * `requeue` - Put it back for redelivery, otherwise dead-letter it
    async fn reject(&mut self, delivery: &Delivery, requeue: bool) -> Result<(), TransportError>;
}

/// What to do with a message the handler keeps failing on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerFailurePolicy {
    Requeue,
    DeadLetter,
}

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive failed attempts tolerated before giving up
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), doubling up to `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone)]
pub struct HandlerPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub failure_policy: HandlerFailurePolicy,
}

#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Routing key the queue is bound with
    pub routing_key: String,
    pub reconnect: ReconnectPolicy,
    pub handler: HandlerPolicy,
}

impl ConsumerSettings {
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self {
            routing_key: config.routing_key.clone(),
            reconnect: ReconnectPolicy {
                initial_backoff: Duration::from_millis(config.reconnect.initial_backoff_ms),
                max_backoff: Duration::from_millis(config.reconnect.max_backoff_ms),
                max_attempts: config.reconnect.max_attempts,
            },
            handler: HandlerPolicy {
                max_attempts: config.handler.max_attempts,
                retry_delay: Duration::from_millis(config.handler.retry_delay_ms),
                failure_policy: config.handler.failure_policy,
            },
        }
    }
}

/// Liveness of the consumer task, exposed on the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsumerHealth {
    Starting,
    Connected,
    Reconnecting { attempt: u32 },
    Stopped,
    Failed,
}

/// Supervised consumer feeding broker deliveries to a notification handler.
///
/// A delivery is acknowledged only after the handler succeeds, giving
/// at-least-once processing. Transport failures drop the session and
/// reconnect with exponential backoff; handler failures never stop the loop.
pub struct EventConsumer<C, H>
where
    C: BrokerConnector,
    H: NotificationHandler + ?Sized,
{
    connector: C,
    handler: Arc<H>,
    settings: ConsumerSettings,
    health: watch::Sender<ConsumerHealth>,
}

impl<C, H> EventConsumer<C, H>
where
    C: BrokerConnector,
    H: NotificationHandler + ?Sized,
{
    /// Create a new consumer.
    ///
    /// # Arguments
    /// * `connector` - Opens broker sessions
    /// * `handler` - Side effect run for every delivery
    /// * `settings` - Routing key, reconnect and retry policies
    pub fn new(connector: C, handler: Arc<H>, settings: ConsumerSettings) -> Self {
        let (health, _) = watch::channel(ConsumerHealth::Starting);

        Self {
            connector,
            handler,
            settings,
            health,
        }
    }

    /// Subscribe to health changes.
    pub fn health(&self) -> watch::Receiver<ConsumerHealth> {
        self.health.subscribe()
    }

    fn set_health(&self, health: ConsumerHealth) {
        self.health.send_replace(health);
    }

    /// Run until `shutdown` is cancelled or reconnect attempts are exhausted.
    ///
    /// This is a long-running task that should be spawned in a separate tokio task.
    ///
    /// # Errors
    /// * `ReconnectAttemptsExhausted` - The broker stayed unreachable
    pub async fn start_consuming(self, shutdown: CancellationToken) -> Result<(), ConsumerError> {
        tracing::info!(
            routing_key = %self.settings.routing_key,
            "Starting event consumer loop"
        );

        let mut failures: u32 = 0;

        loop {
            let connected = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                connected = self.connector.connect() => connected,
            };

            let last_error = match connected {
                Ok(mut source) => {
                    failures = 0;
                    self.set_health(ConsumerHealth::Connected);
                    tracing::info!("Event consumer connected");

                    match self.consume(&mut source, &shutdown).await {
                        Ok(()) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "Event consumer session ended");
                            e
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Event consumer failed to connect");
                    e
                }
            };

            failures += 1;
            if failures > self.settings.reconnect.max_attempts {
                self.set_health(ConsumerHealth::Failed);
                tracing::error!(
                    attempts = self.settings.reconnect.max_attempts,
                    error = %last_error,
                    "Event consumer giving up"
                );
                return Err(ConsumerError::ReconnectAttemptsExhausted {
                    attempts: self.settings.reconnect.max_attempts,
                    last_error: last_error.to_string(),
                });
            }

            let backoff = self.settings.reconnect.backoff(failures);
            self.set_health(ConsumerHealth::Reconnecting { attempt: failures });
            tracing::info!(
                attempt = failures,
                backoff_ms = backoff.as_millis() as u64,
                "Reconnecting event consumer"
            );

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        self.set_health(ConsumerHealth::Stopped);
        tracing::info!("Event consumer stopped");

        Ok(())
    }

    /// Pull deliveries from one session until shutdown (`Ok`) or a transport failure.
    async fn consume(
        &self,
        source: &mut C::Source,
        shutdown: &CancellationToken,
    ) -> Result<(), TransportError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                next = source.next_delivery() => next?,
            };

            let delivery = next.ok_or_else(|| {
                TransportError::ConnectionLost("broker closed the session".to_string())
            })?;

            self.dispatch(source, delivery, shutdown).await?;
        }
    }

    async fn dispatch(
        &self,
        source: &mut C::Source,
        delivery: Delivery,
        shutdown: &CancellationToken,
    ) -> Result<(), TransportError> {
        if delivery.routing_key != self.settings.routing_key {
            tracing::debug!(
                routing_key = %delivery.routing_key,
                "Skipping delivery with foreign routing key"
            );
            return source.ack(delivery.tag).await;
        }

        let max_attempts = self.settings.handler.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.handler.handle(&delivery).await {
                Ok(()) => {
                    tracing::debug!(
                        partition = delivery.tag.partition,
                        offset = delivery.tag.offset,
                        redelivered = delivery.redelivered,
                        "Delivery handled"
                    );
                    return source.ack(delivery.tag).await;
                }
                Err(e) => e,
            };

            let retryable = !matches!(error, HandlerError::InvalidPayload);
            if !retryable || attempt >= max_attempts {
                return self.settle_failed(source, &delivery, &error, attempt).await;
            }

            tracing::warn!(
                attempt,
                max_attempts,
                error = %error,
                "Notification handler failed, retrying"
            );

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return source.reject(&delivery, true).await,
                _ = tokio::time::sleep(self.settings.handler.retry_delay) => {}
            }
        }
    }

    async fn settle_failed(
        &self,
        source: &mut C::Source,
        delivery: &Delivery,
        error: &HandlerError,
        attempts: u32,
    ) -> Result<(), TransportError> {
        let policy = self.settings.handler.failure_policy;

        tracing::error!(
            attempts,
            error = %error,
            policy = ?policy,
            partition = delivery.tag.partition,
            offset = delivery.tag.offset,
            "Notification handler gave up on delivery"
        );

        match policy {
            HandlerFailurePolicy::Requeue => source.reject(delivery, true).await,
            HandlerFailurePolicy::DeadLetter => source.reject(delivery, false).await,
        }
    }
}
