pub mod consumer;
pub mod kafka;
pub mod memory;
pub mod producer;
pub mod topology;

pub use consumer::ConsumerHealth;
pub use consumer::EventConsumer;
pub use kafka::KafkaConnector;
pub use memory::InMemoryBroker;
pub use memory::InMemoryConnector;
pub use memory::InMemoryEventPublisher;
pub use producer::KafkaEventPublisher;
pub use topology::Topology;
