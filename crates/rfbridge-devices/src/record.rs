//! Device records and learned RF buttons.
//!
//! The registry keeps one record per device as reported by the vendor cloud.
//! RF bridges list their learned remotes under `tags.zyx_info`:
//!
//! ```json
//! {
//!   "deviceid": "1000abcdef",
//!   "name": "RF Bridge",
//!   "tags": {
//!     "zyx_info": [
//!       {"name": "Switch1", "buttonName": [{"0": "On"}]},
//!       {"name": "Curtain", "buttonName": [{"1": "Open"}, {"2": "Close"}]}
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Device model id of the Sonoff RF Bridge.
pub const RF_BRIDGE_UIID: u32 = 28;

/// Device record as stored by the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub deviceid: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Device model id, when the registry knows it.
    #[serde(default)]
    pub uiid: Option<u32>,
    /// Free-form vendor metadata. Kept untyped so a malformed section never
    /// prevents the record from loading.
    #[serde(default)]
    pub tags: Value,
    /// Last known device state.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl DeviceRecord {
    pub fn new(deviceid: impl Into<String>) -> Self {
        Self {
            deviceid: deviceid.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_uiid(mut self, uiid: u32) -> Self {
        self.uiid = Some(uiid);
        self
    }

    pub fn with_tags(mut self, tags: Value) -> Self {
        self.tags = tags;
        self
    }

    /// Whether the record describes an RF bridge. Unknown models count as a match.
    pub fn is_rf_bridge(&self) -> bool {
        self.uiid.is_none_or(|uiid| uiid == RF_BRIDGE_UIID)
    }

    pub fn button_map(&self) -> ButtonMap {
        ButtonMap::from_tags(&self.tags)
    }
}

/// One learned remote inside `tags.zyx_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteInfo {
    #[serde(default)]
    pub name: String,
    /// Single-key mappings of channel to label.
    #[serde(rename = "buttonName", default)]
    pub button_name: Vec<Map<String, Value>>,
}

/// Channel number (as text) to button name, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonMap {
    buttons: Vec<(String, String)>,
}

impl ButtonMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from a record's `tags`.
    ///
    /// A remote with several buttons contributes each `{channel: label}`
    /// pair; a remote with a single button maps that channel to the
    /// remote's own name. Missing or malformed metadata yields an empty map.
    pub fn from_tags(tags: &Value) -> Self {
        let mut map = Self::new();

        let Some(zyx_info) = tags.get("zyx_info") else {
            tracing::debug!("No zyx_info in device tags, no learned buttons");
            return map;
        };

        let remotes: Vec<RemoteInfo> = match serde_json::from_value(zyx_info.clone()) {
            Ok(remotes) => remotes,
            Err(e) => {
                tracing::warn!("Ignoring malformed zyx_info: {}", e);
                return map;
            }
        };

        for remote in &remotes {
            match remote.button_name.as_slice() {
                [] => {
                    tracing::debug!("Remote '{}' has no buttons, skipping", remote.name);
                }
                [single] => {
                    if let Some(channel) = single.keys().next() {
                        map.insert(channel.clone(), remote.name.clone());
                    }
                }
                buttons => {
                    for button in buttons {
                        for (channel, label) in button {
                            map.insert(channel.clone(), label_text(label));
                        }
                    }
                }
            }
        }

        map
    }

    /// Insert or replace a button. A replaced button keeps its position.
    pub fn insert(&mut self, channel: impl Into<String>, name: impl Into<String>) {
        let channel = channel.into();
        let name = name.into();
        match self.buttons.iter_mut().find(|(c, _)| *c == channel) {
            Some(entry) => entry.1 = name,
            None => self.buttons.push((channel, name)),
        }
    }

    /// Name of the button on `channel`.
    pub fn get(&self, channel: &str) -> Option<&str> {
        self.buttons
            .iter()
            .find(|(c, _)| c == channel)
            .map(|(_, n)| n.as_str())
    }

    /// First channel whose button is called `name`.
    pub fn channel_for(&self, name: &str) -> Option<&str> {
        self.buttons
            .iter()
            .find(|(_, n)| n == name)
            .map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.buttons.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }
}

fn label_text(label: &Value) -> String {
    match label {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_button_takes_remote_name() {
        let tags = json!({"zyx_info": [{"buttonName": [{"1": "Light"}], "name": "Switch1"}]});
        let map = ButtonMap::from_tags(&tags);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("1"), Some("Switch1"));
    }

    #[test]
    fn test_multi_button_keeps_labels() {
        let tags = json!({"zyx_info": [{
            "buttonName": [{"1": "Light"}, {"2": "Fan"}],
            "name": "Switch1"
        }]});
        let map = ButtonMap::from_tags(&tags);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("1"), Some("Light"));
        assert_eq!(map.get("2"), Some("Fan"));
        assert_eq!(map.channel_for("Switch1"), None);
    }

    #[test]
    fn test_duplicate_channel_last_write_wins() {
        let tags = json!({"zyx_info": [
            {"buttonName": [{"3": "Lamp"}], "name": "Lamp"},
            {"buttonName": [{"4": "Up"}, {"3": "Down"}], "name": "Blind"}
        ]});
        let map = ButtonMap::from_tags(&tags);

        assert_eq!(map.get("3"), Some("Down"));
        assert_eq!(map.iter().next(), Some(("3", "Down")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_missing_or_malformed_metadata_is_empty() {
        assert!(ButtonMap::from_tags(&Value::Null).is_empty());
        assert!(ButtonMap::from_tags(&json!({})).is_empty());
        assert!(ButtonMap::from_tags(&json!({"zyx_info": "nope"})).is_empty());
        assert!(ButtonMap::from_tags(&json!({"zyx_info": [{"buttonName": 5}]})).is_empty());
    }

    #[test]
    fn test_empty_button_list_skipped() {
        let tags = json!({"zyx_info": [
            {"buttonName": [], "name": "Broken"},
            {"buttonName": [{"0": "x"}], "name": "Doorbell"}
        ]});
        let map = ButtonMap::from_tags(&tags);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("0"), Some("Doorbell"));
    }

    #[test]
    fn test_channel_for_returns_first_match() {
        let mut map = ButtonMap::new();
        map.insert("5", "Same");
        map.insert("2", "Same");
        assert_eq!(map.channel_for("Same"), Some("5"));
    }

    #[test]
    fn test_record_deserialize_lenient() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "deviceid": "1000abcdef",
            "name": "Bridge",
            "uiid": 28,
            "tags": "garbage"
        }))
        .unwrap();

        assert!(record.is_rf_bridge());
        assert!(record.button_map().is_empty());
        assert!(record.params.is_empty());
        assert!(!DeviceRecord::new("x").with_uiid(1).is_rf_bridge());
    }
}
