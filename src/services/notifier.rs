//! Live-update listener registry
//!
//! Each connected socket owns an unbounded queue drained by its writer task.
//! Broadcasting pushes the same snapshot into every queue and forgets
//! listeners whose queue has been closed.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::models::ServerEvent;
use crate::observability::Metrics;

/// Queue feeding one listener's socket writer
pub type ListenerSender = mpsc::UnboundedSender<ServerEvent>;

/// Unique listener identifier
pub type ListenerId = u64;

pub struct ListenerRegistry {
    listeners: DashMap<ListenerId, ListenerSender>,
    next_id: AtomicU64,
    metrics: Option<Arc<Metrics>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
            metrics: None,
        }
    }

    /// Registry that keeps the listener gauge and broadcast counter current
    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new()
        }
    }

    pub fn register(&self, tx: ListenerSender) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, tx);
        self.update_gauge();

        info!(listener_id = id, listeners = self.len(), "Listener connected");
        id
    }

    pub fn unregister(&self, id: ListenerId) {
        if self.listeners.remove(&id).is_some() {
            self.update_gauge();
            info!(listener_id = id, listeners = self.len(), "Listener disconnected");
        }
    }

    /// Send to a single listener; false if it is gone
    pub fn send_to(&self, id: ListenerId, event: ServerEvent) -> bool {
        match self.listeners.get(&id) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Push `event` to every listener, returning how many accepted it
    pub fn broadcast(&self, event: ServerEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.listeners.iter() {
            if entry.value().send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*entry.key());
            }
        }

        // Removal must happen after the iterator releases its shard locks
        for id in closed {
            self.unregister(id);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_broadcast();
        }

        debug!(event = event.name(), delivered, "Broadcast sent");
        delivered
    }

    /// Drop every listener queue. Each writer drains what is already queued,
    /// then sees its channel close and ends the connection.
    pub fn close_all(&self) -> usize {
        let closed = self.listeners.len();
        self.listeners.clear();
        self.update_gauge();

        info!(closed, "Closed all listeners");
        closed
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn update_gauge(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_socket_listeners(self.listeners.len());
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
