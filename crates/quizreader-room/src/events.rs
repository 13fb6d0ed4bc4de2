//! Typed inbound room events
//!
//! The wire carries JSON objects with a `type` discriminant. [`ServerEvent`]
//! covers the event types a reading client acts on; anything else parses as
//! [`ServerEvent::Other`] and stays reachable through raw listeners.

use crate::error::RoomResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Internal event emitted once the transport opens.
pub const CONNECTED: &str = "_connected";
/// Internal event emitted when the transport closes unexpectedly.
pub const DISCONNECTED: &str = "_disconnected";

/// Verdict attached to a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directive {
    Accept,
    Reject,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    // room / player lifecycle
    ConnectionAcknowledged {
        user_id: Option<String>,
        #[serde(default)]
        players: Value,
        question_progress: Option<u32>,
    },
    Join {
        user_id: String,
        username: String,
    },
    Leave {
        user_id: String,
        username: String,
    },
    ForcedRemoval {
        reason: Option<String>,
    },

    // tossups
    StartNextTossup {
        #[serde(default)]
        tossup: Value,
    },
    UpdateQuestion {
        word: String,
    },
    Buzz {
        user_id: String,
        username: String,
    },
    GiveTossupAnswer {
        user_id: String,
        username: String,
        given_answer: String,
        directive: Directive,
        directed_prompt: Option<String>,
        score: Option<i64>,
    },
    RevealTossupAnswer {
        answer: String,
    },
    EndCurrentTossup,

    // bonuses
    StartNextBonus {
        #[serde(default)]
        bonus: Value,
    },
    RevealLeadin {
        leadin: String,
    },
    RevealNextPart {
        part: String,
        current_part: Option<usize>,
    },
    GiveBonusAnswer {
        user_id: String,
        username: String,
        given_answer: String,
        directive: Directive,
        directed_prompt: Option<String>,
    },
    EndCurrentBonus,

    Chat {
        user_id: String,
        username: String,
        message: String,
    },
    Pause {
        username: Option<String>,
        pausing: Option<bool>,
        paused_time: Option<i64>,
    },
    Error {
        message: String,
    },

    #[serde(other)]
    Other,
}

impl ServerEvent {
    /// Parse a raw inbound message. Unknown types yield [`ServerEvent::Other`].
    pub fn from_value(value: &Value) -> RoomResult<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Whether this event opens a new question the reader should clear for.
    pub fn starts_question(&self) -> bool {
        matches!(self, Self::StartNextTossup { .. } | Self::StartNextBonus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_answer_verdict() {
        let value = json!({
            "type": "give-tossup-answer",
            "userId": "u1",
            "username": "Ann",
            "givenAnswer": "melville",
            "directive": "accept",
            "score": 15,
            "celerity": 0.4
        });
        match ServerEvent::from_value(&value).unwrap() {
            ServerEvent::GiveTossupAnswer {
                given_answer,
                directive,
                directed_prompt,
                score,
                ..
            } => {
                assert_eq!(given_answer, "melville");
                assert_eq!(directive, Directive::Accept);
                assert_eq!(directed_prompt, None);
                assert_eq!(score, Some(15));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_update_question_word() {
        let value = json!({"type": "update-question", "word": "Ahab"});
        assert_eq!(
            ServerEvent::from_value(&value).unwrap(),
            ServerEvent::UpdateQuestion { word: "Ahab".into() }
        );
    }

    #[test]
    fn unit_variants_parse_with_extra_fields() {
        let value = json!({"type": "end-current-tossup", "starred": true});
        assert_eq!(ServerEvent::from_value(&value).unwrap(), ServerEvent::EndCurrentTossup);
    }

    #[test]
    fn unknown_type_is_other() {
        let value = json!({"type": "toggle-lock", "lock": true});
        assert_eq!(ServerEvent::from_value(&value).unwrap(), ServerEvent::Other);
    }

    #[test]
    fn known_type_with_wrong_shape_is_error() {
        let value = json!({"type": "chat", "userId": 7});
        assert!(ServerEvent::from_value(&value).is_err());
    }

    #[test]
    fn question_starts() {
        let value = json!({"type": "start-next-tossup", "tossup": {"question": "..."}});
        assert!(ServerEvent::from_value(&value).unwrap().starts_question());
    }
}
