//! `MessageBus`: a topic-addressed publish/subscribe abstraction standing
//! in for a real AMQP/Pulsar client, in the shape of a typed
//! publisher/subscriber/handler trio without pulling in a broker
//! dependency. The in-process implementation is
//! `tokio::sync::broadcast`-backed: each topic gets its own channel,
//! created lazily on first publish or subscribe.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};

const TOPIC_CAPACITY: usize = 1024;

/// Bytes published on a topic, already JSON-encoded by the caller (see
/// `codec`). The bus itself is payload-format agnostic.
pub type Envelope = Arc<[u8]>;

#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<Envelope>;
}

/// At-least-once, in-process bus. Consumers that weren't subscribed
/// before a publish simply miss it, and a lagging consumer drops older
/// messages rather than blocking the publisher (`broadcast`'s own
/// at-most-once-per-lagging-consumer semantics); the orchestrator's own
/// idempotence is what makes duplicate or dropped deliveries tolerable
/// here.
pub struct InProcessBus {
    topics: Mutex<HashMap<String, broadcast::Sender<Envelope>>>,
}

impl Default for InProcessBus {
    fn default() -> Self {
        InProcessBus { topics: Mutex::new(HashMap::new()) }
    }
}

impl InProcessBus {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender_for(&self, topic: &str) -> broadcast::Sender<Envelope> {
        let mut topics = self.topics.lock().await;
        topics
        .entry(topic.to_string())
        .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
        .clone()
    }
}

#[async_trait]
impl MessageBus for InProcessBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let sender = self.sender_for(topic).await;
        let envelope: Envelope = Arc::from(payload.into_boxed_slice());
        match sender.send(envelope) {
            Ok(receiver_count) => {
                debug!(topic, receiver_count, "published message");
                Ok(())
            }
            Err(_) => {
                warn!(topic, "published with no active subscribers");
                Err(TransportError::NoSubscribers(topic.to_string()))
            }
        }
    }

    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<Envelope> {
        self.sender_for(topic).await.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_payload() {
        let bus = InProcessBus::new();
        let mut rx = bus.subscribe("context.in").await;
        bus.publish("context.in", b"hello".to_vec()).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(&*received, b"hello");
    }

    #[tokio::test]
    async fn publish_without_subscribers_reports_no_subscribers() {
        let bus = InProcessBus::new();
        let err = bus.publish("nobody.listening", b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, TransportError::NoSubscribers(_)));
    }

    #[tokio::test]
    async fn distinct_topics_do_not_cross_talk() {
        let bus = InProcessBus::new();
        let mut rx_a = bus.subscribe("a").await;
        let _rx_b = bus.subscribe("b").await;
        bus.publish("a", b"only-a".to_vec()).await.unwrap();
        let received = rx_a.recv().await.unwrap();
        assert_eq!(&*received, b"only-a");
    }
}
