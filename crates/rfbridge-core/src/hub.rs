//! Event-bus backed [`EntityHost`].

use parking_lot::RwLock;

use crate::config::RemoteConfig;
use crate::entity::EntityHost;
use crate::event::HubEvent;
use crate::eventbus::EventBus;

/// Minimal hub: routes entity events and refresh requests onto an event bus.
pub struct Hub {
    bus: EventBus,
    config: RemoteConfig,
    entities: RwLock<Vec<String>>,
}

impl Hub {
    pub fn new(bus: EventBus) -> Self {
        Self::with_config(bus, RemoteConfig::default())
    }

    pub fn with_config(bus: EventBus, config: RemoteConfig) -> Self {
        Self {
            bus,
            config,
            entities: RwLock::new(Vec::new()),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Entity ids registered so far, in setup order.
    pub fn entities(&self) -> Vec<String> {
        self.entities.read().clone()
    }
}

impl EntityHost for Hub {
    fn schedule_update_state(&self, entity_id: &str) {
        self.bus.publish(HubEvent::StateChanged {
            entity_id: entity_id.to_string(),
        });
    }

    fn fire(&self, event: HubEvent) {
        self.bus.publish(event);
    }

    fn add_entity(&self, entity_id: &str) {
        let mut entities = self.entities.write();
        if !entities.iter().any(|e| e == entity_id) {
            tracing::info!("Registered entity {}", entity_id);
            entities.push(entity_id.to_string());
        }
    }

    fn remote_config(&self) -> RemoteConfig {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schedule_update_publishes_state_changed() {
        let hub = Hub::new(EventBus::new());
        let mut rx = hub.event_bus().subscribe();

        hub.schedule_update_state("remote.a");

        let (event, _) = rx.recv().await.unwrap();
        assert_eq!(
            event,
            HubEvent::StateChanged {
                entity_id: "remote.a".to_string()
            }
        );
    }

    #[test]
    fn test_add_entity_deduplicates() {
        let hub = Hub::new(EventBus::new());
        hub.add_entity("remote.a");
        hub.add_entity("remote.b");
        hub.add_entity("remote.a");
        assert_eq!(hub.entities(), vec!["remote.a", "remote.b"]);
    }
}
