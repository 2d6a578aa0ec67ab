//! RF bridge device integration.
//!
//! Exposes an eWeLink RF bridge (Sonoff RF Bridge, uiid 28) to the hub as a
//! `remote` entity.
//!
//! ## Architecture
//!
//! - **DeviceRegistry**: shared registry contract; owns device records and the
//!   transport that delivers commands. [`MemoryRegistry`] is the in-process
//!   implementation.
//! - **ButtonMap**: learned RF buttons, read once from the device record.
//! - **RemoteAdapter**: the `remote` entity. Turns pushed `rfTrig<N>` states
//!   into `remote-triggered` hub events and forwards transmit/learn commands
//!   to the registry.
//! - **setup_platform**: builds one adapter per discovered device.

pub mod error;
pub mod message;
pub mod platform;
pub mod record;
pub mod registry;
pub mod remote;

pub use error::{RegistryError, RegistryResult, RemoteError};
pub use message::{RfCommand, RfState, Trigger, triggers};
pub use platform::{DiscoveryInfo, setup_platform};
pub use record::{ButtonMap, DeviceRecord, RF_BRIDGE_UIID, RemoteInfo};
pub use registry::{DeviceRegistry, MemoryRegistry, SentPayload, StateHandler, StateMap};
pub use remote::RemoteAdapter;
