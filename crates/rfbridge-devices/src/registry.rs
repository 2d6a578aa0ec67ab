//! Device registry contract and the in-memory registry.
//!
//! The registry is shared by every entity of the integration. It owns the
//! device records, pushes device state to registered handlers and delivers
//! command payloads to devices. [`MemoryRegistry`] keeps everything in
//! process and records sent payloads instead of talking to a transport.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::{RegistryError, RegistryResult};
use crate::record::DeviceRecord;

/// Flat device state as pushed by the registry.
pub type StateMap = Map<String, Value>;

/// Receiver of pushed device state.
pub trait StateHandler: Send + Sync {
    /// Called with the changed state keys and transport attributes
    /// (e.g. whether the update came from the cloud or the LAN).
    fn on_state_update(&self, state: &StateMap, attrs: &StateMap);
}

/// Registry shared by all device entities.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Current record of a device.
    fn device(&self, device_id: &str) -> Option<DeviceRecord>;

    /// Route future state pushes for `device_id` to `handler`.
    fn add_handler(&self, device_id: &str, handler: Arc<dyn StateHandler>);

    /// Bring handlers up to date with the device state.
    ///
    /// Without `force` the registry may answer from its cache.
    async fn refresh(&self, device_id: &str, force: bool) -> RegistryResult<()>;

    /// Deliver a command payload to the device.
    async fn send(&self, device_id: &str, payload: Value) -> RegistryResult<()>;
}

/// A payload accepted by [`MemoryRegistry::send`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentPayload {
    pub device_id: String,
    pub payload: Value,
}

/// In-process registry.
#[derive(Default)]
pub struct MemoryRegistry {
    devices: DashMap<String, DeviceRecord>,
    handlers: DashMap<String, Vec<Arc<dyn StateHandler>>>,
    sent: Mutex<Vec<SentPayload>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a device record.
    pub fn register_device(&self, record: DeviceRecord) {
        tracing::debug!("Registering device {}", record.deviceid);
        self.devices.insert(record.deviceid.clone(), record);
    }

    /// Merge `state` into the device's cached params and dispatch it to
    /// every handler of the device.
    pub fn push_state(
        &self,
        device_id: &str,
        state: StateMap,
        attrs: StateMap,
    ) -> RegistryResult<()> {
        {
            let mut record = self
                .devices
                .get_mut(device_id)
                .ok_or_else(|| RegistryError::DeviceNotFound(device_id.to_string()))?;
            for (key, value) in &state {
                record.params.insert(key.clone(), value.clone());
            }
        }

        self.dispatch(device_id, &state, &attrs);
        Ok(())
    }

    /// Payloads sent so far, oldest first.
    pub fn sent(&self) -> Vec<SentPayload> {
        self.sent.lock().clone()
    }

    /// Forget recorded payloads.
    pub fn take_sent(&self) -> Vec<SentPayload> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn handler_count(&self, device_id: &str) -> usize {
        self.handlers.get(device_id).map(|h| h.len()).unwrap_or(0)
    }

    fn dispatch(&self, device_id: &str, state: &StateMap, attrs: &StateMap) {
        // Clone out of the map so handlers run without holding a shard lock.
        let handlers = match self.handlers.get(device_id) {
            Some(handlers) => handlers.value().clone(),
            None => {
                tracing::debug!("No state handlers for device {}", device_id);
                return;
            }
        };
        for handler in handlers {
            handler.on_state_update(state, attrs);
        }
    }
}

#[async_trait]
impl DeviceRegistry for MemoryRegistry {
    fn device(&self, device_id: &str) -> Option<DeviceRecord> {
        self.devices.get(device_id).map(|r| r.value().clone())
    }

    fn add_handler(&self, device_id: &str, handler: Arc<dyn StateHandler>) {
        self.handlers
            .entry(device_id.to_string())
            .or_default()
            .push(handler);
    }

    async fn refresh(&self, device_id: &str, force: bool) -> RegistryResult<()> {
        let params = self
            .device(device_id)
            .ok_or_else(|| RegistryError::DeviceNotFound(device_id.to_string()))?
            .params;

        if params.is_empty() {
            tracing::debug!("No cached state for device {} (force={})", device_id, force);
            return Ok(());
        }

        let mut attrs = StateMap::new();
        attrs.insert("cached".to_string(), Value::Bool(!force));
        self.dispatch(device_id, &params, &attrs);
        Ok(())
    }

    async fn send(&self, device_id: &str, payload: Value) -> RegistryResult<()> {
        if !self.devices.contains_key(device_id) {
            return Err(RegistryError::DeviceNotFound(device_id.to_string()));
        }

        tracing::debug!("Sending to {}: {}", device_id, payload);
        self.sent.lock().push(SentPayload {
            device_id: device_id.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(StateMap, StateMap)>>,
    }

    impl StateHandler for Recorder {
        fn on_state_update(&self, state: &StateMap, attrs: &StateMap) {
            self.seen.lock().push((state.clone(), attrs.clone()));
        }
    }

    fn obj(value: Value) -> StateMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_push_state_dispatches_and_caches() {
        let registry = MemoryRegistry::new();
        registry.register_device(DeviceRecord::new("dev1"));
        let recorder = Arc::new(Recorder::default());
        registry.add_handler("dev1", recorder.clone());
        assert_eq!(registry.handler_count("dev1"), 1);

        registry
            .push_state("dev1", obj(json!({"cmd": "trigger", "rfTrig0": "ts"})), StateMap::new())
            .unwrap();

        assert_eq!(recorder.seen.lock().len(), 1);
        let record = registry.device("dev1").unwrap();
        assert_eq!(record.params.get("rfTrig0"), Some(&json!("ts")));
    }

    #[tokio::test]
    async fn test_push_state_unknown_device() {
        let registry = MemoryRegistry::new();
        let err = registry
            .push_state("missing", StateMap::new(), StateMap::new())
            .unwrap_err();
        assert!(matches!(err, RegistryError::DeviceNotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_replays_cached_params() {
        let registry = MemoryRegistry::new();
        let mut record = DeviceRecord::new("dev1");
        record.params.insert("rfTrig2".to_string(), json!("ts"));
        registry.register_device(record);

        let recorder = Arc::new(Recorder::default());
        registry.add_handler("dev1", recorder.clone());

        registry.refresh("dev1", false).await.unwrap();

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1.get("cached"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_refresh_without_params_is_quiet() {
        let registry = MemoryRegistry::new();
        registry.register_device(DeviceRecord::new("dev1"));
        let recorder = Arc::new(Recorder::default());
        registry.add_handler("dev1", recorder.clone());

        registry.refresh("dev1", true).await.unwrap();
        assert!(recorder.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_send_records_payloads() {
        let registry = MemoryRegistry::new();
        registry.register_device(DeviceRecord::new("dev1"));

        registry
            .send("dev1", json!({"cmd": "transmit", "rfChl": 1}))
            .await
            .unwrap();
        assert!(matches!(
            registry.send("nope", json!({})).await,
            Err(RegistryError::DeviceNotFound(_))
        ));

        let sent = registry.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].device_id, "dev1");
        assert!(registry.sent().is_empty());
    }
}
