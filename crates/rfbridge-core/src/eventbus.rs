//! Event bus for hub-side notifications.
//!
//! Entities fire events and request state refreshes through the bus; hub
//! automations, UIs and tests subscribe to it.

use crate::event::{EventMetadata, HubEvent};
use tokio::sync::broadcast;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Event bus for the hub.
///
/// The event bus uses a broadcast channel to distribute events to all
/// subscribers. Publishing never blocks, so it is safe to call from the
/// synchronous state handlers that device registries invoke.
#[derive(Clone)]
pub struct EventBus {
    /// Broadcast channel sender
    tx: broadcast::Sender<(HubEvent, EventMetadata)>,
    /// Event bus name for identification
    name: String,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the specified capacity.
    ///
    /// The capacity determines how many events are buffered for slow subscribers.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            name: "default".to_string(),
        }
    }

    /// Create a new event bus with a name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            tx: broadcast::channel(DEFAULT_CHANNEL_CAPACITY).0,
            name: name.into(),
        }
    }

    /// Get the name of this event bus.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event with default metadata.
    ///
    /// If there are no subscribers the event is discarded. Returns `true` if
    /// there was at least one subscriber.
    pub fn publish(&self, event: HubEvent) -> bool {
        self.publish_with_source(event, "hub")
    }

    /// Publish an event with a custom source.
    pub fn publish_with_source(&self, event: HubEvent, source: impl Into<String>) -> bool {
        self.publish_with_metadata(event, EventMetadata::new(source))
    }

    /// Publish an event with custom metadata.
    pub fn publish_with_metadata(&self, event: HubEvent, metadata: EventMetadata) -> bool {
        tracing::trace!(bus = %self.name, event_type = event.event_type(), "publishing event");
        self.tx.send((event, metadata)).is_ok()
    }

    /// Subscribe to all events.
    ///
    /// If the subscriber falls behind, older events may be dropped.
    pub fn subscribe(&self) -> EventBusReceiver {
        EventBusReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Create a filtered subscription helper for common patterns.
    pub fn filter(&self) -> FilterBuilder {
        FilterBuilder {
            tx: self.tx.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for all events from the event bus.
pub struct EventBusReceiver {
    rx: broadcast::Receiver<(HubEvent, EventMetadata)>,
}

impl EventBusReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` if the event bus is closed.
    pub async fn recv(&mut self) -> Option<(HubEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event bus receiver lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&mut self) -> Option<(HubEvent, EventMetadata)> {
        self.rx.try_recv().ok()
    }

    /// Drain every buffered event without blocking.
    pub fn drain(&mut self) -> Vec<HubEvent> {
        let mut events = Vec::new();
        while let Some((event, _)) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Receiver for filtered events from the event bus.
pub struct FilteredReceiver<F>
where
    F: Fn(&HubEvent) -> bool + Send,
{
    rx: broadcast::Receiver<(HubEvent, EventMetadata)>,
    filter: F,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&HubEvent) -> bool + Send,
{
    fn new(rx: broadcast::Receiver<(HubEvent, EventMetadata)>, filter: F) -> Self {
        Self { rx, filter }
    }

    /// Receive the next event matching the filter.
    ///
    /// Returns `None` if the event bus is closed.
    pub async fn recv(&mut self) -> Option<(HubEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok((event, meta)) => {
                    if (self.filter)(&event) {
                        return Some((event, meta));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive a matching event without blocking.
    pub fn try_recv(&mut self) -> Option<(HubEvent, EventMetadata)> {
        while let Ok((event, meta)) = self.rx.try_recv() {
            if (self.filter)(&event) {
                return Some((event, meta));
            }
        }
        None
    }
}

/// Builder for creating filtered subscriptions.
pub struct FilterBuilder {
    tx: broadcast::Sender<(HubEvent, EventMetadata)>,
}

impl FilterBuilder {
    /// Subscribe to remote trigger events only.
    pub fn remote_events(&self) -> FilteredReceiver<fn(&HubEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), HubEvent::is_remote_event)
    }

    /// Subscribe to state refresh requests only.
    pub fn state_events(&self) -> FilteredReceiver<fn(&HubEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), HubEvent::is_state_event)
    }

    /// Subscribe to events about one entity.
    pub fn entity(
        &self,
        entity_id: impl Into<String>,
    ) -> FilteredReceiver<impl Fn(&HubEvent) -> bool + Send + 'static> {
        let target = entity_id.into();
        FilteredReceiver::new(self.tx.subscribe(), move |event: &HubEvent| {
            event.entity_id() == target
        })
    }

    /// Subscribe with a custom filter function.
    pub fn custom<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&HubEvent) -> bool + Send + 'static,
    {
        FilteredReceiver::new(self.tx.subscribe(), filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RemoteAttributes;

    fn triggered(entity_id: &str, command: u32) -> HubEvent {
        HubEvent::RemoteTriggered {
            entity_id: entity_id.to_string(),
            attributes: RemoteAttributes {
                command,
                ts: "2020-05-10T14:10:17.000Z".to_string(),
                name: None,
            },
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        assert!(bus.publish(triggered("remote.a", 1)));

        let (event, meta) = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "remote-triggered");
        assert_eq!(meta.source, "hub");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.publish(triggered("remote.a", 1)));
    }

    #[tokio::test]
    async fn test_filtered_subscription() {
        let bus = EventBus::new();
        let mut remote_rx = bus.filter().remote_events();
        let mut state_rx = bus.filter().state_events();

        bus.publish(HubEvent::StateChanged {
            entity_id: "remote.a".to_string(),
        });
        bus.publish(triggered("remote.a", 2));

        let (event, _) = remote_rx.recv().await.unwrap();
        assert!(event.is_remote_event());
        assert!(remote_rx.try_recv().is_none());

        let (event, _) = state_rx.recv().await.unwrap();
        assert!(event.is_state_event());
        assert!(state_rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_entity_filter() {
        let bus = EventBus::new();
        let mut rx = bus.filter().entity("remote.b");

        bus.publish(triggered("remote.a", 1));
        bus.publish(triggered("remote.b", 7));

        let (event, _) = rx.try_recv().unwrap();
        assert_eq!(event.entity_id(), "remote.b");
    }

    #[tokio::test]
    async fn test_publish_with_source_and_drain() {
        let bus = EventBus::with_name("test");
        let mut rx = bus.subscribe();
        assert_eq!(bus.name(), "test");

        bus.publish_with_source(triggered("remote.a", 1), "rfbridge");
        bus.publish(triggered("remote.a", 2));

        let (_, meta) = rx.try_recv().unwrap();
        assert_eq!(meta.source, "rfbridge");
        assert_eq!(rx.drain().len(), 1);
    }
}
