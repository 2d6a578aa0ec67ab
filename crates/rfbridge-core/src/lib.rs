//! Core traits and types for rfbridge.
//!
//! This crate defines the hub-side abstractions that device integrations
//! plug into: the event bus, hub events, the entity contracts and the
//! shared configuration defaults.

pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod hub;
pub mod logging;

// Event exports
pub use event::{EventMetadata, HubEvent, RemoteAttributes};

// Event bus exports
pub use eventbus::{
    DEFAULT_CHANNEL_CAPACITY, EventBus, EventBusReceiver, FilterBuilder, FilteredReceiver,
};

pub use entity::{Entity, EntityHost, RemoteEntity, SupportedFeatures};
pub use error::{Error, Result};
pub use hub::Hub;

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::{RemoteConfig, env_vars};
    pub use crate::entity::{Entity, EntityHost, RemoteEntity, SupportedFeatures};
    pub use crate::error::{Error, Result};
    pub use crate::event::{EventMetadata, HubEvent, RemoteAttributes};
    pub use crate::eventbus::EventBus;
    pub use crate::hub::Hub;
}
