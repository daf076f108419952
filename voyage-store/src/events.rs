use async_trait::async_trait;
use tracing::info;
use voyage_core::events::EventSink;
use voyage_shared::models::events::{DomainEvent, EventEnvelope};

/// Writes every domain event to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn publish(&self, event: DomainEvent) {
        let topic = event.topic();
        let key = event.key().to_string();
        match serde_json::to_string(&EventEnvelope::new(event)) {
            Ok(payload) => info!(topic, key = %key, payload = %payload, "domain event"),
            Err(e) => tracing::error!("Failed to encode {} event: {}", topic, e),
        }
    }
}

#[cfg(feature = "kafka")]
pub use kafka::EventProducer;

#[cfg(feature = "kafka")]
mod kafka {
    use super::*;
    use rdkafka::config::ClientConfig;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use rdkafka::util::Timeout;
    use std::time::Duration;
    use tracing::error;

    /// Publishes domain events to a Kafka topic, keyed by document id.
    #[derive(Clone)]
    pub struct EventProducer {
        producer: FutureProducer,
        topic: String,
    }

    impl EventProducer {
        pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
            let producer: FutureProducer = ClientConfig::new()
                .set("bootstrap.servers", brokers)
                .set("message.timeout.ms", "5000")
                .create()?;

            Ok(Self {
                producer,
                topic: topic.to_string(),
            })
        }
    }

    #[async_trait]
    impl EventSink for EventProducer {
        async fn publish(&self, event: DomainEvent) {
            let key = event.key().to_string();
            let payload = match serde_json::to_string(&EventEnvelope::new(event)) {
                Ok(p) => p,
                Err(e) => {
                    error!("Failed to encode event {}: {}", key, e);
                    return;
                }
            };

            let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);
            match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
                Ok(delivery) => {
                    info!(
                        "Sent event to {}/{}: partition {} offset {}",
                        self.topic, key, delivery.partition, delivery.offset
                    );
                }
                Err((e, _msg)) => error!("Failed to send event to {}: {}", self.topic, e),
            }
        }
    }
}
