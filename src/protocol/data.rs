use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entity::{Mode, TimerState};

/// A [`Protocol`] represents the underlying data type used by
/// the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Protocol {
    Request(Request),
    Response(Response),
}

/// A [`Request`] represents requests from a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetCurrentState,
    StartTimer,
    /// Pauses the countdown.
    StopTimer,
    ResetTimer,
    /// The mode key is validated by the daemon, so that a bad key gets a
    /// [`Response::Failure`] instead of an undecodable frame.
    ChangeMode {
        new_mode: String,
    },
    /// Re-read the durations from the store.
    ChangeDurations,
    /// Keep the connection open and stream timer events.
    Subscribe,
    Read {
        key: String,
    },
    Write {
        key: String,
        value: Value,
    },
}

/// A [`Response`] represents a daemon's reply, or an event pushed to a
/// subscribed view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    State { state: TimerState },
    Ack { reply: String },
    Failure { reason: String },
    Value { key: String, value: Option<Value> },
    TimerUpdate { state: TimerState },
    SessionComplete { mode: Mode },
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::domain::entity::ModeDurations;

    #[test]
    fn protocol_request_deserialize() {
        let text = json!({
            "type": "Request",
            "method": "CHANGE_MODE",
            "new_mode": "short_break"
        });
        assert_eq!(
            serde_json::from_value::<Protocol>(text).unwrap(),
            Protocol::Request(Request::ChangeMode {
                new_mode: "short_break".to_owned()
            })
        );

        let text = json!({
            "type": "Request",
            "method": "WRITE",
            "key": "blockedSites",
            "value": ["youtube.com"]
        });
        assert_eq!(
            serde_json::from_value::<Protocol>(text).unwrap(),
            Protocol::Request(Request::Write {
                key: "blockedSites".to_owned(),
                value: json!(["youtube.com"]),
            })
        );

        let text = json!({ "type": "Request", "method": "STOP_TIMER" });
        assert_eq!(
            serde_json::from_value::<Protocol>(text).unwrap(),
            Protocol::Request(Request::StopTimer)
        );

        let text = json!({ "type": "Request", "method": "SKIP" });
        assert!(serde_json::from_value::<Protocol>(text).is_err());
    }

    #[test]
    fn protocol_response_serialize() {
        let state = TimerState::new(ModeDurations::default());
        let data = Protocol::Response(Response::State { state });

        assert_eq!(
            serde_json::to_value(data).unwrap(),
            json!({
                "type": "Response",
                "method": "STATE",
                "state": {
                    "timeLeft": 1500,
                    "duration": 1500,
                    "status": "stopped",
                    "mode": "focus",
                    "mode_durations": {
                        "focus": 1500,
                        "short_break": 300,
                        "long_break": 1800
                    }
                }
            })
        );

        let data = Protocol::Response(Response::SessionComplete {
            mode: Mode::LongBreak,
        });
        assert_eq!(
            serde_json::to_value(data).unwrap(),
            json!({ "type": "Response", "method": "SESSION_COMPLETE", "mode": "long_break" })
        );
    }
}
