//! Publish/subscribe bridge for real-time notifications.
//!
//! Services publish through the [`Notifier`] trait and never see connections. The in-process
//! implementation, [`TopicRegistry`], keeps one bounded channel per connected session plus a
//! topic membership table, and delivers with `try_send`:
//!
//! - publishing never blocks the caller,
//! - delivery is at-most-once (a full or closed buffer drops the event),
//! - nothing is persisted or replayed for sessions that were not connected.

use crate::constants::ADMINS_TOPIC;
use medairon_types::Role;
use medairon_uuid::RecordId;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Routing key identifying a set of subscribed connections.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// All sessions of one doctor (`doctor_<id>`).
    Doctor(RecordId),
    /// All sessions of one nurse (`nurse_<id>`).
    Nurse(RecordId),
    /// A named broadcast group, such as administrative dashboards.
    Group(String),
}

impl Topic {
    pub fn admins() -> Self {
        Topic::Group(ADMINS_TOPIC.to_string())
    }

    /// The personal topic a staff member's sessions join, if their role has one.
    pub fn personal(role: Role, id: RecordId) -> Option<Self> {
        match role {
            Role::Doctor => Some(Topic::Doctor(id)),
            Role::Nurse => Some(Topic::Nurse(id)),
            Role::Admin | Role::Patient => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Doctor(id) => write!(f, "doctor_{id}"),
            Topic::Nurse(id) => write!(f, "nurse_{id}"),
            Topic::Group(name) => f.write_str(name),
        }
    }
}

/// Event as delivered to a subscribed connection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotifierEvent {
    pub event: String,
    pub payload: serde_json::Value,
}

/// Outcome of a successful publish.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Connections the event was queued for.
    pub delivered: usize,
    /// Connections whose buffer was full or closed.
    pub dropped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to encode {event} payload: {source}")]
    Encode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no subscriber of {topic} accepted the event ({dropped} dropped)")]
    Undelivered { topic: String, dropped: usize },
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Contract the alerting and assignment flows need from a publish/subscribe primitive.
pub trait Notifier: Send + Sync {
    /// Queue `payload` as `event` for every connection subscribed to `topic`.
    ///
    /// Must not block. A topic with no subscribers is a successful publish with zero
    /// deliveries.
    fn publish(
        &self,
        topic: &Topic,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<Delivery, NotifyError>;
}

/// Identifier of one connected session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, mpsc::Sender<NotifierEvent>>,
    topics: HashMap<Topic, HashSet<ConnectionId>>,
}

/// In-process topic registry shared by the HTTP layer (subscribe side) and services (publish
/// side).
pub struct TopicRegistry {
    buffer: usize,
    next_id: AtomicU64,
    inner: RwLock<Registry>,
}

impl TopicRegistry {
    /// Create a registry whose connections buffer up to `buffer` undelivered events.
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            next_id: AtomicU64::new(1),
            inner: RwLock::new(Registry::default()),
        }
    }

    /// Register a new connection and return the receiving half of its event buffer.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<NotifierEvent>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);
        self.inner.write().connections.insert(id, tx);
        tracing::debug!(connection = %id, "notifier connection registered");
        (id, rx)
    }

    /// Add `connection` to `topic`. Joining a topic twice is a no-op.
    pub fn subscribe(&self, connection: ConnectionId, topic: Topic) -> Result<(), NotifyError> {
        let mut inner = self.inner.write();
        if !inner.connections.contains_key(&connection) {
            return Err(NotifyError::UnknownConnection(connection));
        }
        tracing::debug!(connection = %connection, topic = %topic, "joined topic");
        inner.topics.entry(topic).or_default().insert(connection);
        Ok(())
    }

    pub fn unsubscribe(&self, connection: ConnectionId, topic: &Topic) {
        let mut inner = self.inner.write();
        if let Some(members) = inner.topics.get_mut(topic) {
            members.remove(&connection);
            if members.is_empty() {
                inner.topics.remove(topic);
            }
        }
    }

    /// Drop a connection and all of its topic memberships.
    pub fn disconnect(&self, connection: ConnectionId) {
        let mut inner = self.inner.write();
        inner.connections.remove(&connection);
        inner.topics.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
        tracing::debug!(connection = %connection, "notifier connection closed");
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.inner.read().topics.get(topic).map_or(0, HashSet::len)
    }
}

impl Notifier for TopicRegistry {
    fn publish(
        &self,
        topic: &Topic,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<Delivery, NotifyError> {
        let inner = self.inner.read();
        let Some(members) = inner.topics.get(topic) else {
            return Ok(Delivery::default());
        };

        let message = NotifierEvent {
            event: event.to_string(),
            payload: payload.clone(),
        };

        let mut delivery = Delivery::default();
        for connection in members {
            let sent = inner
                .connections
                .get(connection)
                .map(|tx| tx.try_send(message.clone()).is_ok())
                .unwrap_or(false);
            if sent {
                delivery.delivered += 1;
            } else {
                delivery.dropped += 1;
            }
        }

        if delivery.delivered == 0 && delivery.dropped > 0 {
            return Err(NotifyError::Undelivered {
                topic: topic.to_string(),
                dropped: delivery.dropped,
            });
        }
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn topic_names_follow_role_prefix() {
        let id = RecordId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(
            Topic::Doctor(id).to_string(),
            "doctor_550e8400e29b41d4a716446655440000"
        );
        assert_eq!(
            Topic::Nurse(id).to_string(),
            "nurse_550e8400e29b41d4a716446655440000"
        );
        assert_eq!(Topic::admins().to_string(), "admins");
        assert_eq!(Topic::personal(Role::Admin, id), None);
    }

    #[test]
    fn publish_without_subscribers_delivers_nothing() {
        let registry = TopicRegistry::new(4);
        let delivery = registry
            .publish(&Topic::admins(), "ping", &json!({}))
            .unwrap();
        assert_eq!(delivery, Delivery::default());
    }

    #[tokio::test]
    async fn subscribers_receive_only_their_topics() {
        let registry = TopicRegistry::new(4);
        let doctor = Topic::Doctor(RecordId::new());
        let nurse = Topic::Nurse(RecordId::new());

        let (a, mut rx_a) = registry.connect();
        let (b, mut rx_b) = registry.connect();
        registry.subscribe(a, doctor.clone()).unwrap();
        registry.subscribe(b, nurse.clone()).unwrap();

        let delivery = registry
            .publish(&doctor, "vital_alert", &json!({ "n": 1 }))
            .unwrap();
        assert_eq!(delivery.delivered, 1);

        let event = rx_a.recv().await.unwrap();
        assert_eq!(event.event, "vital_alert");
        assert_eq!(event.payload, json!({ "n": 1 }));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn full_buffer_drops_event() {
        let registry = TopicRegistry::new(1);
        let topic = Topic::admins();
        let (conn, _rx) = registry.connect();
        registry.subscribe(conn, topic.clone()).unwrap();

        registry.publish(&topic, "first", &json!(1)).unwrap();
        let err = registry.publish(&topic, "second", &json!(2)).unwrap_err();
        assert!(matches!(err, NotifyError::Undelivered { dropped: 1, .. }));
    }

    #[test]
    fn disconnect_removes_memberships() {
        let registry = TopicRegistry::new(4);
        let topic = Topic::admins();
        let (conn, _rx) = registry.connect();
        registry.subscribe(conn, topic.clone()).unwrap();
        registry.subscribe(conn, topic.clone()).unwrap();
        assert_eq!(registry.subscriber_count(&topic), 1);

        registry.disconnect(conn);
        assert_eq!(registry.subscriber_count(&topic), 0);
        assert!(matches!(
            registry.subscribe(conn, topic),
            Err(NotifyError::UnknownConnection(_))
        ));
    }

    #[test]
    fn unsubscribe_leaves_other_members() {
        let registry = TopicRegistry::new(4);
        let topic = Topic::admins();
        let (a, _rx_a) = registry.connect();
        let (b, _rx_b) = registry.connect();
        registry.subscribe(a, topic.clone()).unwrap();
        registry.subscribe(b, topic.clone()).unwrap();

        registry.unsubscribe(a, &topic);
        assert_eq!(registry.subscriber_count(&topic), 1);
    }
}
