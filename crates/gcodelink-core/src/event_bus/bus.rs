//! Event bus
//!
//! Handlers are closures keyed by [`SubscriptionId`]. [`EventBus::publish`]
//! snapshots the matching handlers and calls them on the publishing thread
//! after the registry lock is released, so a handler may subscribe,
//! unsubscribe or publish again.

use std::sync::OnceLock;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};
use crate::types::{DataCallback, ThreadSafeRwMap};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "sub-{}", &simple[..8])
    }
}

/// Which events a subscription receives
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Every event.
    #[default]
    All,
    /// Events in any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Only events of one category
    pub fn only(category: EventCategory) -> Self {
        EventFilter::Categories(vec![category])
    }

    /// Whether `event` passes the filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

struct Subscription {
    filter: EventFilter,
    handler: DataCallback<AppEvent>,
}

/// Application-wide event distribution
#[derive(Default)]
pub struct EventBus {
    subscriptions: ThreadSafeRwMap<SubscriptionId, Subscription>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every matching handler
    ///
    /// Returns how many handlers were called.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("Event: {}", event.description());

        let targets: Vec<DataCallback<AppEvent>> = self
            .subscriptions
            .read()
            .values()
            .filter(|sub| sub.filter.matches(&event))
            .map(|sub| sub.handler.clone())
            .collect();

        for handler in &targets {
            handler(event.clone());
        }
        targets.len()
    }

    /// Register `handler` for events passing `filter`
    ///
    /// Stream progress is published from the streaming worker, so handlers
    /// should return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        let subscription = Subscription {
            filter,
            handler: std::sync::Arc::new(handler),
        };
        self.subscriptions.write().insert(id, subscription);
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Remove a subscription; false when `id` is unknown
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscriptions.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// The process-wide bus used by the session, streamer and file loader
pub fn event_bus() -> &'static EventBus {
    static BUS: OnceLock<EventBus> = OnceLock::new();
    BUS.get_or_init(EventBus::new)
}

/// Publish an event on the process-wide bus
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::event_bus::event_bus().publish($event)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PrinterStatus;
    use crate::event_bus::events::{ConnectionEvent, StreamEvent};
    use crate::types::thread_safe_vec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn connected() -> AppEvent {
        AppEvent::Connection(ConnectionEvent::Connected {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
        })
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();

        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);
        assert!(id.to_string().starts_with("sub-"));

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(connected()), 0);
    }

    #[test]
    fn test_event_filtering() {
        let bus = EventBus::new();
        let connection_count = Arc::new(AtomicUsize::new(0));
        let stream_count = Arc::new(AtomicUsize::new(0));

        let cc = connection_count.clone();
        bus.subscribe(EventFilter::only(EventCategory::Connection), move |_| {
            cc.fetch_add(1, Ordering::SeqCst);
        });

        let sc = stream_count.clone();
        bus.subscribe(EventFilter::only(EventCategory::Stream), move |_| {
            sc.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish(connected()), 1);
        bus.publish(AppEvent::Stream(StreamEvent::Progress(
            PrinterStatus::printing(1, 3),
        )));
        bus.publish(AppEvent::Stream(StreamEvent::NotConnected));

        assert_eq!(connection_count.load(Ordering::SeqCst), 1);
        assert_eq!(stream_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_handler_may_reenter_bus() {
        let bus = Arc::new(EventBus::new());
        let seen = thread_safe_vec();

        let inner = bus.clone();
        let log = seen.clone();
        bus.subscribe(EventFilter::only(EventCategory::Connection), move |event| {
            log.lock().push(event.description());
            inner.subscribe(EventFilter::All, |_| {});
            inner.publish(AppEvent::Stream(StreamEvent::NotConnected));
        });

        bus.publish(connected());
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(*seen.lock(), vec!["Connected to /dev/ttyUSB0 @ 115200 baud"]);
    }
}
