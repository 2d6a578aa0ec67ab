//! Entity contracts between the hub and device integrations.
//!
//! An integration exposes each physical device as an entity. The hub
//! attaches the entity through [`Entity::added_to_host`], after which the
//! entity can fire events and request state refreshes through the
//! [`EntityHost`] it was handed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::event::HubEvent;

/// Capability flags an entity declares to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SupportedFeatures(u32);

impl SupportedFeatures {
    pub const NONE: Self = Self(0);
    /// The remote can record new commands.
    pub const LEARN_COMMAND: Self = Self(1);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SupportedFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What the hub offers to an attached entity.
pub trait EntityHost: Send + Sync {
    /// Ask the hub to re-read and re-render the entity's state.
    fn schedule_update_state(&self, entity_id: &str);

    /// Publish an event on the hub bus.
    fn fire(&self, event: HubEvent);

    /// Record a newly set up entity.
    fn add_entity(&self, entity_id: &str);

    /// Remote entity settings, such as the default inter-command delay.
    fn remote_config(&self) -> RemoteConfig;
}

/// Base contract for every entity.
#[async_trait]
pub trait Entity: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Hub-wide identifier, e.g. `remote.1000abcdef`.
    fn entity_id(&self) -> &str;

    /// Stable identifier of the underlying device.
    fn unique_id(&self) -> Option<&str>;

    /// Friendly name.
    fn name(&self) -> &str;

    /// Whether the hub must poll for state. Push-driven entities return `false`.
    fn should_poll(&self) -> bool {
        true
    }

    fn is_on(&self) -> bool;

    /// Extra attributes rendered next to the state.
    fn state_attributes(&self) -> Option<serde_json::Value>;

    /// Lifecycle hook run once the hub has attached the entity.
    async fn added_to_host(&self, host: Arc<dyn EntityHost>) -> Result<(), Self::Error>;
}

/// Contract of the hub's `remote` entity domain.
#[async_trait]
pub trait RemoteEntity: Entity {
    fn supported_features(&self) -> SupportedFeatures;

    async fn turn_on(&self);

    async fn turn_off(&self);

    /// Send a sequence of commands, pausing `delay` between them.
    ///
    /// `None` uses the host's default delay.
    async fn send_command(
        &self,
        command: &[String],
        delay: Option<Duration>,
    ) -> Result<(), Self::Error>;

    /// Put the device into learning mode for the given command.
    async fn learn_command(&self, command: &[String]) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_features() {
        let features = SupportedFeatures::NONE | SupportedFeatures::LEARN_COMMAND;
        assert_eq!(features.bits(), 1);
        assert!(features.contains(SupportedFeatures::LEARN_COMMAND));
        assert!(!SupportedFeatures::NONE.contains(SupportedFeatures::LEARN_COMMAND));
        assert!(SupportedFeatures::default().contains(SupportedFeatures::NONE));
    }
}
