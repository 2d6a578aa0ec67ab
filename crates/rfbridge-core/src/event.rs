//! Hub events.

use serde::{Deserialize, Serialize};

use crate::config::events;

/// Display attributes of a remote after it reported a received RF signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAttributes {
    /// Channel the bridge matched the signal to.
    pub command: u32,
    /// Timestamp reported by the device.
    pub ts: String,
    /// Learned button name for the channel, if known.
    pub name: Option<String>,
}

/// Events published on the hub event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "kebab-case")]
pub enum HubEvent {
    /// A remote received a signal on a learned channel.
    RemoteTriggered {
        entity_id: String,
        #[serde(flatten)]
        attributes: RemoteAttributes,
    },

    /// An entity asked the hub to re-render its state.
    StateChanged { entity_id: String },
}

impl HubEvent {
    /// Name of the event as seen by hub automations.
    pub fn event_type(&self) -> &'static str {
        match self {
            HubEvent::RemoteTriggered { .. } => events::REMOTE_TRIGGERED,
            HubEvent::StateChanged { .. } => events::STATE_CHANGED,
        }
    }

    /// Entity the event is about.
    pub fn entity_id(&self) -> &str {
        match self {
            HubEvent::RemoteTriggered { entity_id, .. } | HubEvent::StateChanged { entity_id } => {
                entity_id
            }
        }
    }

    pub fn is_remote_event(&self) -> bool {
        matches!(self, HubEvent::RemoteTriggered { .. })
    }

    pub fn is_state_event(&self) -> bool {
        matches!(self, HubEvent::StateChanged { .. })
    }
}

/// Metadata attached to every published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: uuid::Uuid,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub source: String,
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            source: source.into(),
        }
    }
}
