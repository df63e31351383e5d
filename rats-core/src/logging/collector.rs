//! Event sinks.

use super::event::{EventKind, LogCategory, LogEvent, LogLevel};
use crate::types::{NodeState, SessionId};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Events kept by [`BufferedCollector::with_default_capacity`].
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Identifier returned by [`BufferedCollector::subscribe`].
pub type SubscriberId = u64;

/// Receives every event a session emits.
pub trait LogCollector: Send + Sync {
    /// Record one event.
    fn collect(&self, event: LogEvent);

    /// Number of events held.
    fn len(&self) -> usize;

    /// Whether no event is held.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type Subscriber = Arc<dyn Fn(&LogEvent) + Send + Sync>;

/// Keeps the newest events of every session in a bounded buffer and forwards
/// each one to subscribers.
///
/// Subscribers run on the thread that emitted the event, outside of any
/// collector lock, so they may subscribe or unsubscribe themselves.
pub struct BufferedCollector {
    events: RwLock<VecDeque<LogEvent>>,
    capacity: usize,
    sequence: AtomicU64,
    subscribers: Mutex<Vec<(SubscriberId, Subscriber)>>,
    next_subscriber: AtomicU64,
}

impl BufferedCollector {
    /// Keep at most `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: RwLock::new(VecDeque::new()),
            capacity,
            sequence: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber: AtomicU64::new(1),
        }
    }

    /// Keep at most [`DEFAULT_BUFFER_CAPACITY`] events.
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }

    /// Call `callback` for every event collected from now on.
    pub fn subscribe(&self, callback: Subscriber) -> SubscriberId {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, callback));
        id
    }

    /// Stop notifying `id`. Returns whether it was subscribed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let Some(index) = subscribers.iter().position(|(sid, _)| *sid == id) else {
            return false;
        };
        subscribers.remove(index);
        true
    }

    /// Every event held, oldest first.
    pub fn all(&self) -> Vec<LogEvent> {
        self.events.read().iter().cloned().collect()
    }

    /// Events of one session.
    pub fn by_session(&self, session_id: SessionId) -> Vec<LogEvent> {
        self.filtered(|e| e.session_id == session_id)
    }

    /// Events about one node of one session.
    pub fn by_node(&self, session_id: SessionId, node: &str) -> Vec<LogEvent> {
        self.filtered(|e| e.session_id == session_id && e.node.as_deref() == Some(node))
    }

    /// Events at or above `min_level`.
    pub fn by_level(&self, min_level: LogLevel) -> Vec<LogEvent> {
        self.filtered(|e| e.level() >= min_level)
    }

    /// Events in `category`.
    pub fn by_category(&self, category: LogCategory) -> Vec<LogEvent> {
        self.filtered(|e| e.category() == category)
    }

    /// The states `node` moved through in `session_id`, in order.
    pub fn transitions(&self, session_id: SessionId, node: &str) -> Vec<NodeState> {
        self.by_node(session_id, node)
            .iter()
            .filter_map(LogEvent::reached)
            .collect()
    }

    /// Whether `session_id` emitted an event matching `kind`.
    pub fn saw(&self, session_id: SessionId, kind: impl Fn(&EventKind) -> bool) -> bool {
        self.events
            .read()
            .iter()
            .any(|e| e.session_id == session_id && kind(&e.kind))
    }

    /// Drop every event held.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    fn filtered(&self, predicate: impl Fn(&LogEvent) -> bool) -> Vec<LogEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }
}

impl LogCollector for BufferedCollector {
    fn collect(&self, mut event: LogEvent) {
        event.id = self.sequence.fetch_add(1, Ordering::Relaxed);

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in &subscribers {
            callback(&event);
        }

        let mut events = self.events.write();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    fn len(&self) -> usize {
        self.events.read().len()
    }
}

impl Default for BufferedCollector {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for BufferedCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedCollector")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullCollector;

impl LogCollector for NullCollector {
    fn collect(&self, _event: LogEvent) {}

    fn len(&self) -> usize {
        0
    }
}
