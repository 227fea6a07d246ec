// Event Bus Implementation - Ordered Pub/Sub for Swarm Domain Events
//
// Every published event is stamped with a sequence number, appended to an
// in-memory append-only log, then fanned out on a tokio broadcast channel.
// Sequence assignment, append and fan-out happen under one lock so consumers
// observe events in publish-call order.
//
// The log lives in memory only; durable storage is left to subscribers.

use crate::domain::events::DomainEvent;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// A domain event together with its position in the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: DomainEvent,
}

/// Append-only, totally ordered event trail.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<RecordedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, event: DomainEvent) -> RecordedEvent {
        let recorded = RecordedEvent {
            sequence: self.entries.len() as u64 + 1,
            event,
        };
        self.entries.push(recorded.clone());
        recorded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RecordedEvent] {
        &self.entries
    }
}

/// Event bus for publishing and subscribing to swarm domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<RecordedEvent>>,
    log: Arc<Mutex<EventLog>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity bounds how many events a slow subscriber may fall behind
    /// before it starts lagging. The log itself is unbounded.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
            log: Arc::new(Mutex::new(EventLog::new())),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Record an event and deliver it to all live subscribers
    pub fn publish(&self, event: DomainEvent) -> RecordedEvent {
        let mut log = self.log.lock();
        let recorded = log.append(event);
        debug!(
            sequence = recorded.sequence,
            event_type = recorded.event.event_type(),
            "Publishing event"
        );

        // send() only fails when nobody is listening
        if self.sender.send(recorded.clone()).is_err() {
            debug!("No subscribers listening to event");
        }
        recorded
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Copy of the full trail in publish order
    pub fn snapshot(&self) -> Vec<RecordedEvent> {
        self.log.lock().entries().to_vec()
    }

    /// Events with a sequence number strictly greater than `sequence`
    pub fn since(&self, sequence: u64) -> Vec<RecordedEvent> {
        let log = self.log.lock();
        let start = (sequence as usize).min(log.len());
        log.entries()[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiver for live domain events
pub struct EventReceiver {
    receiver: broadcast::Receiver<RecordedEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<RecordedEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without waiting
    pub fn try_recv(&mut self) -> Result<RecordedEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentId, AgentType};
    use crate::domain::events::SwarmEvent;

    fn added(id: &str) -> DomainEvent {
        DomainEvent::now(SwarmEvent::AgentAddedToSwarm {
            agent_id: AgentId::new(id),
            agent_type: AgentType::Coder,
        })
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish(added("agent-1"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.sequence, 1);
        match received.event.event {
            SwarmEvent::AgentAddedToSwarm { agent_id, .. } => {
                assert_eq!(agent_id, AgentId::new("agent-1"));
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_log_preserves_publish_order_without_subscribers() {
        let event_bus = EventBus::new(4);
        for i in 0..10 {
            event_bus.publish(added(&format!("agent-{}", i)));
        }

        let trail = event_bus.snapshot();
        assert_eq!(trail.len(), 10);
        let sequences: Vec<u64> = trail.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn test_since_returns_tail() {
        let event_bus = EventBus::default();
        event_bus.publish(added("agent-1"));
        event_bus.publish(added("agent-2"));
        event_bus.publish(DomainEvent::now(SwarmEvent::CoordinatorShutdown {}));

        let tail = event_bus.since(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 2);
        assert_eq!(tail[1].event.event_type(), "CoordinatorShutdown");
        assert!(event_bus.since(99).is_empty());
    }

    #[test]
    fn test_multiple_subscribers_see_same_order() {
        tokio_test::block_on(async {
            let event_bus = EventBus::new(10);
            let mut first = event_bus.subscribe();
            let mut second = event_bus.subscribe();
            assert_eq!(event_bus.subscriber_count(), 2);

            event_bus.publish(added("agent-1"));
            event_bus.publish(added("agent-2"));

            for receiver in [&mut first, &mut second] {
                assert_eq!(receiver.recv().await.unwrap().sequence, 1);
                assert_eq!(receiver.recv().await.unwrap().sequence, 2);
                assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
            }
        });
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let event_bus = EventBus::new(2);
        let mut receiver = event_bus.subscribe();

        for i in 0..5 {
            event_bus.publish(added(&format!("agent-{}", i)));
        }

        assert!(matches!(receiver.recv().await, Err(EventBusError::Lagged(3))));
        // the log keeps everything
        assert_eq!(event_bus.len(), 5);
    }
}
