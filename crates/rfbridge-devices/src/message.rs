//! RF bridge message shapes.
//!
//! Outbound commands and inbound state pushes share one flat JSON shape for
//! both the cloud and the LAN transport:
//!
//! - `{"cmd": "trigger", "rfTrig0": "2020-05-10T14:10:17.000Z"}`
//! - `{"cmd": "transmit", "rfChl": 3}`
//! - `{"cmd": "capture", "rfChl": 1}`

use rfbridge_core::config::TRIGGER_PREFIX;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Command delivered to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum RfCommand {
    /// Replay the code learned on a channel.
    Transmit {
        #[serde(rename = "rfChl")]
        rf_chl: u32,
    },
    /// Learn a new code on a channel.
    Capture {
        #[serde(rename = "rfChl")]
        rf_chl: u32,
    },
}

impl RfCommand {
    pub fn channel(&self) -> u32 {
        match self {
            RfCommand::Transmit { rf_chl } | RfCommand::Capture { rf_chl } => *rf_chl,
        }
    }

    /// JSON payload handed to the registry.
    pub fn to_payload(&self) -> Value {
        match self {
            RfCommand::Transmit { rf_chl } => json!({"cmd": "transmit", "rfChl": rf_chl}),
            RfCommand::Capture { rf_chl } => json!({"cmd": "capture", "rfChl": rf_chl}),
        }
    }
}

/// A received RF signal extracted from a pushed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Channel suffix exactly as it appeared in the key.
    pub channel: String,
    /// Channel as a number, if the suffix parses.
    pub command: Option<u32>,
    /// Timestamp reported by the bridge.
    pub ts: String,
}

/// Every `rfTrig<N>` entry of a pushed state, in map order.
pub fn triggers(state: &Map<String, Value>) -> impl Iterator<Item = Trigger> + '_ {
    state.iter().filter_map(|(key, value)| {
        let channel = key.strip_prefix(TRIGGER_PREFIX)?;
        let ts = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(Trigger {
            channel: channel.to_string(),
            command: channel.parse().ok(),
            ts,
        })
    })
}

/// Classified inbound state push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RfState {
    /// Received RF signals, one per `rfTrig<N>` key.
    Triggers(Vec<Trigger>),
    /// Echo of a transmit or capture command.
    Command(RfCommand),
    /// Any other state (online flags, firmware info, ...).
    Other,
}

impl RfState {
    /// Classify a pushed state.
    ///
    /// `rfTrig<N>` keys win over the `cmd` field, so a trigger is recognised
    /// even when the bridge omits or mislabels `cmd`.
    pub fn parse(state: &Map<String, Value>) -> Self {
        let found: Vec<Trigger> = triggers(state).collect();
        if !found.is_empty() {
            return RfState::Triggers(found);
        }
        match serde_json::from_value::<RfCommand>(Value::Object(state.clone())) {
            Ok(command) => RfState::Command(command),
            Err(_) => RfState::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_payloads() {
        assert_eq!(
            RfCommand::Transmit { rf_chl: 3 }.to_payload(),
            json!({"cmd": "transmit", "rfChl": 3})
        );
        assert_eq!(
            RfCommand::Capture { rf_chl: 1 }.to_payload(),
            json!({"cmd": "capture", "rfChl": 1})
        );
    }

    #[test]
    fn test_command_parses_echoed_state() {
        let cmd: RfCommand = serde_json::from_value(json!({"cmd": "capture", "rfChl": 1})).unwrap();
        assert_eq!(cmd, RfCommand::Capture { rf_chl: 1 });
        assert_eq!(cmd.channel(), 1);

        let trigger = json!({"cmd": "trigger", "rfTrig0": "x"});
        assert!(serde_json::from_value::<RfCommand>(trigger).is_err());
    }

    #[test]
    fn test_triggers_extracts_matching_keys() {
        let state = json!({"cmd": "trigger", "rfTrig3": "2020-05-10T14:10:17.000Z", "rfChl": 3});
        let found: Vec<Trigger> = triggers(state.as_object().unwrap()).collect();

        assert_eq!(
            found,
            vec![Trigger {
                channel: "3".to_string(),
                command: Some(3),
                ts: "2020-05-10T14:10:17.000Z".to_string(),
            }]
        );
    }

    #[test]
    fn test_trigger_with_bad_suffix() {
        let state = json!({"rfTrigX": "ts"});
        let found: Vec<Trigger> = triggers(state.as_object().unwrap()).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].command, None);
    }

    #[test]
    fn test_state_classification() {
        let parse = |v: Value| RfState::parse(v.as_object().unwrap());

        match parse(json!({"cmd": "trigger", "rfTrig0": "ts", "rfTrig2": "ts2"})) {
            RfState::Triggers(found) => {
                let channels: Vec<&str> = found.iter().map(|t| t.channel.as_str()).collect();
                assert_eq!(channels, vec!["0", "2"]);
            }
            other => panic!("expected triggers, got {:?}", other),
        }
        assert_eq!(
            parse(json!({"cmd": "transmit", "rfChl": 3})),
            RfState::Command(RfCommand::Transmit { rf_chl: 3 })
        );
        assert_eq!(
            parse(json!({"cmd": "capture", "rfChl": 1})),
            RfState::Command(RfCommand::Capture { rf_chl: 1 })
        );
        assert_eq!(parse(json!({"cmd": "trigger"})), RfState::Other);
        assert_eq!(parse(json!({"online": true})), RfState::Other);
    }

    #[test]
    fn test_trigger_keys_win_over_cmd() {
        let state = json!({"cmd": "transmit", "rfChl": 3, "rfTrig3": "ts"});
        assert!(matches!(
            RfState::parse(state.as_object().unwrap()),
            RfState::Triggers(ref found) if found.len() == 1
        ));
    }
}
