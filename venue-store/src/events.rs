use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};
use venue_core::{NotificationSink, RepoError};
use venue_shared::BookingSummary;

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
    confirmation_topic: String,
}

impl EventProducer {
    pub fn new(brokers: &str, confirmation_topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("enable.idempotence", "true")
            .create()?;

        Ok(Self {
            producer,
            confirmation_topic: confirmation_topic.to_string(),
        })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!("Sent message to {}/{}: partition {} offset {}", topic, key, delivery.partition, delivery.offset);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl NotificationSink for EventProducer {
    async fn deliver(&self, summary: &BookingSummary) -> Result<(), RepoError> {
        let payload = serde_json::to_string(summary)?;
        self.publish(&self.confirmation_topic, &summary.booking_id.to_string(), &payload).await?;
        Ok(())
    }
}
