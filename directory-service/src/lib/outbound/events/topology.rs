use crate::config::BrokerConfig;

/// Exchange, queue and binding shared by the publisher and the consumer.
///
/// Declaring the same topology twice is a no-op on every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
}

impl Topology {
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self {
            exchange: config.exchange.clone(),
            queue: config.queue.clone(),
            routing_key: config.routing_key.clone(),
        }
    }

    /// Destination of messages the handler gave up on.
    pub fn dead_letter_topic(&self) -> String {
        format!("{}.dead-letter", self.exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_letter_topic() {
        let topology = Topology {
            exchange: "directory.events".to_string(),
            queue: "directory.notifications".to_string(),
            routing_key: "directory".to_string(),
        };

        assert_eq!(topology.dead_letter_topic(), "directory.events.dead-letter");
    }
}
