//! Event bus for flow progress
//!
//! Flows emit events as they start and finish work. Any number of
//! subscribers (a CLI spinner, a log sink, a test) can listen. When nobody
//! is subscribed the event is dropped without blocking the emitter.
//!
//! # Example
//!
//! ```no_run
//! use libskyfare::service::events::{Event, EventBus};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::SearchStarted {
//!     token: 1,
//!     origin: "MEX".to_string(),
//!     destination: "VIE".to_string(),
//!     date: "2026-11-15".to_string(),
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub type EventReceiver = broadcast::Receiver<Event>;

/// Broadcast channel shared by every flow of a service
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is the per-subscriber buffer; lagging subscribers lose the
    /// oldest events first
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        // Err only means there are no receivers
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SearchStarted {
        /// Request token of this search
        token: u64,
        origin: String,
        destination: String,
        date: String,
    },

    SearchCompleted {
        token: u64,
        /// Offers kept after truncation
        offers: usize,
    },

    SearchFailed {
        token: u64,
        error: String,
    },

    /// A response arrived after a newer search had started
    SearchDiscarded {
        token: u64,
        latest: u64,
    },

    FlightSaved {
        id: i64,
        origin: String,
        destination: String,
        price: f64,
        currency: String,
    },

    WatcherCreated {
        id: String,
        route: String,
    },

    /// Paused or resumed
    WatcherUpdated {
        id: String,
        is_active: bool,
    },

    WatcherDeleted {
        id: String,
    },

    AlertRead {
        id: String,
        unread_count: u32,
    },
}
