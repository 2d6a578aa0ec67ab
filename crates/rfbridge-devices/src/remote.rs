//! RF bridge `remote` entity.
//!
//! Cloud/LAN states handled here:
//! - `{"cmd": "trigger", "rfTrig0": "2020-05-10T14:10:17.000Z"}` fires
//!   `remote-triggered` with the channel, timestamp and learned button name
//! - `{"cmd": "transmit", "rfChl": 3}` and `{"cmd": "capture", "rfChl": 1}`
//!   are command echoes and are ignored

use async_trait::async_trait;
use parking_lot::RwLock;
use rfbridge_core::config::domains;
use rfbridge_core::{
    Entity, EntityHost, HubEvent, RemoteAttributes, RemoteEntity, SupportedFeatures,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::RemoteError;
use crate::message::{RfCommand, RfState};
use crate::record::ButtonMap;
use crate::registry::{DeviceRegistry, StateHandler, StateMap};

/// `remote` entity backed by one RF bridge.
pub struct RemoteAdapter {
    registry: Arc<dyn DeviceRegistry>,
    device_id: String,
    name: String,
    shared: Arc<RemoteShared>,
    handler_registered: AtomicBool,
}

/// State reachable from the registry's push path.
struct RemoteShared {
    entity_id: String,
    buttons: ButtonMap,
    is_on: RwLock<bool>,
    attrs: RwLock<Option<RemoteAttributes>>,
    host: RwLock<Option<Arc<dyn EntityHost>>>,
}

impl RemoteShared {
    fn schedule_update(&self) {
        match self.host.read().as_ref() {
            Some(host) => host.schedule_update_state(&self.entity_id),
            None => tracing::debug!("{} not attached yet, skipping state update", self.entity_id),
        }
    }

    fn fire(&self, event: HubEvent) {
        match self.host.read().as_ref() {
            Some(host) => host.fire(event),
            None => tracing::debug!(
                "{} not attached yet, dropping {}",
                self.entity_id,
                event.event_type()
            ),
        }
    }
}

impl StateHandler for RemoteShared {
    fn on_state_update(&self, state: &StateMap, _attrs: &StateMap) {
        let found = match RfState::parse(state) {
            RfState::Triggers(found) => found,
            RfState::Command(command) => {
                tracing::debug!("{}: command echo {:?}", self.entity_id, command);
                return;
            }
            RfState::Other => return,
        };

        for trigger in found {
            let Some(command) = trigger.command else {
                tracing::warn!(
                    "{}: ignoring trigger with invalid channel '{}'",
                    self.entity_id,
                    trigger.channel
                );
                continue;
            };

            let attributes = RemoteAttributes {
                command,
                ts: trigger.ts,
                name: self.buttons.get(&trigger.channel).map(str::to_string),
            };
            tracing::debug!(
                "{} triggered: channel={} name={:?}",
                self.entity_id,
                command,
                attributes.name
            );

            *self.attrs.write() = Some(attributes.clone());
            self.fire(HubEvent::RemoteTriggered {
                entity_id: self.entity_id.clone(),
                attributes,
            });
            self.schedule_update();
        }
    }
}

impl RemoteAdapter {
    /// Create the entity for `device_id`, reading learned buttons from the
    /// registry's record. A missing record gives an empty button map.
    pub fn new(registry: Arc<dyn DeviceRegistry>, device_id: impl Into<String>) -> Self {
        let device_id = device_id.into();
        let (name, buttons) = match registry.device(&device_id) {
            Some(record) => {
                if !record.is_rf_bridge() {
                    tracing::warn!(
                        "Device {} is not an RF bridge (uiid {:?})",
                        device_id,
                        record.uiid
                    );
                }
                let name = record.name.clone().unwrap_or_else(|| device_id.clone());
                (name, record.button_map())
            }
            None => {
                tracing::debug!("No record for device {}, no learned buttons", device_id);
                (device_id.clone(), ButtonMap::new())
            }
        };

        let shared = Arc::new(RemoteShared {
            entity_id: format!("{}.{}", domains::REMOTE, device_id),
            buttons,
            is_on: RwLock::new(true),
            attrs: RwLock::new(None),
            host: RwLock::new(None),
        });

        Self {
            registry,
            device_id,
            name,
            shared,
            handler_registered: AtomicBool::new(false),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn buttons(&self) -> &ButtonMap {
        &self.shared.buttons
    }

    /// Last received trigger, if any.
    pub fn attributes(&self) -> Option<RemoteAttributes> {
        self.shared.attrs.read().clone()
    }

    /// Handle a state pushed by the registry.
    pub fn on_state_update(&self, state: &StateMap, attrs: &StateMap) {
        self.shared.on_state_update(state, attrs);
    }

    /// Resolve a command token to a channel number.
    ///
    /// All-digit tokens are channels; anything else is looked up by button name.
    pub fn resolve_channel(&self, token: &str) -> Result<u32, RemoteError> {
        let channel = if is_digits(token) {
            token
        } else {
            self.shared
                .buttons
                .channel_for(token)
                .ok_or_else(|| RemoteError::ButtonNotFound(token.to_string()))?
        };
        parse_channel(channel)
    }

    fn default_delay(&self) -> Duration {
        self.shared
            .host
            .read()
            .as_ref()
            .map(|host| host.remote_config())
            .unwrap_or_default()
            .delay()
    }

    fn set_on(&self, on: bool) {
        *self.shared.is_on.write() = on;
        self.shared.schedule_update();
    }
}

#[async_trait]
impl Entity for RemoteAdapter {
    type Error = RemoteError;

    fn entity_id(&self) -> &str {
        &self.shared.entity_id
    }

    fn unique_id(&self) -> Option<&str> {
        Some(self.device_id.as_str())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn should_poll(&self) -> bool {
        false
    }

    fn is_on(&self) -> bool {
        *self.shared.is_on.read()
    }

    fn state_attributes(&self) -> Option<serde_json::Value> {
        let attrs = self.shared.attrs.read();
        attrs.as_ref().and_then(|a| serde_json::to_value(a).ok())
    }

    async fn added_to_host(&self, host: Arc<dyn EntityHost>) -> Result<(), RemoteError> {
        *self.shared.host.write() = Some(host);
        // One handler per adapter, however often the host re-attaches it.
        if !self.handler_registered.swap(true, Ordering::SeqCst) {
            self.registry.add_handler(&self.device_id, self.shared.clone());
        }
        self.registry.refresh(&self.device_id, false).await?;
        tracing::info!(
            "{} attached with {} learned buttons",
            self.shared.entity_id,
            self.shared.buttons.len()
        );
        Ok(())
    }
}

#[async_trait]
impl RemoteEntity for RemoteAdapter {
    fn supported_features(&self) -> SupportedFeatures {
        SupportedFeatures::LEARN_COMMAND
    }

    async fn turn_on(&self) {
        self.set_on(true);
    }

    async fn turn_off(&self) {
        self.set_on(false);
    }

    async fn send_command(
        &self,
        command: &[String],
        delay: Option<Duration>,
    ) -> Result<(), RemoteError> {
        if !self.is_on() {
            tracing::debug!("{} is off, ignoring send_command", self.shared.entity_id);
            return Ok(());
        }

        let delay = delay.unwrap_or_else(|| self.default_delay());
        for (i, token) in command.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }

            let channel = match self.resolve_channel(token) {
                Ok(channel) => channel,
                Err(e) => {
                    tracing::error!("Not found RF button for {:?}: {}", command, e);
                    return Err(e);
                }
            };

            self.registry
                .send(&self.device_id, RfCommand::Transmit { rf_chl: channel }.to_payload())
                .await?;
        }
        Ok(())
    }

    async fn learn_command(&self, command: &[String]) -> Result<(), RemoteError> {
        if !self.is_on() {
            tracing::debug!("{} is off, ignoring learn_command", self.shared.entity_id);
            return Ok(());
        }

        let token = command.first().ok_or(RemoteError::EmptyCommand)?;
        let channel = parse_channel(token)?;
        tracing::info!("{} learning RF code on channel {}", self.shared.entity_id, channel);
        self.registry
            .send(&self.device_id, RfCommand::Capture { rf_chl: channel }.to_payload())
            .await?;
        Ok(())
    }
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_channel(token: &str) -> Result<u32, RemoteError> {
    token
        .trim()
        .parse()
        .map_err(|_| RemoteError::InvalidChannel(token.to_string()))
}
