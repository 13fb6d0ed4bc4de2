//! Typed outbound actions

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientAction {
    Buzz,
    Next,
    Pause {
        pausing: bool,
        /// Client time in milliseconds since the Unix epoch
        paused_time: i64,
    },
    Chat {
        message: String,
    },
    GiveAnswer {
        given_answer: String,
    },
    GiveAnswerLiveUpdate {
        given_answer: String,
    },
    StartBonusAnswer,
    Ping,
}

impl ClientAction {
    /// Pause or resume, stamped with the current time.
    pub fn pause(pausing: bool) -> Self {
        Self::Pause {
            pausing,
            paused_time: Utc::now().timestamp_millis(),
        }
    }

    /// Wire `type` of this action.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Buzz => "buzz",
            Self::Next => "next",
            Self::Pause { .. } => "pause",
            Self::Chat { .. } => "chat",
            Self::GiveAnswer { .. } => "give-answer",
            Self::GiveAnswerLiveUpdate { .. } => "give-answer-live-update",
            Self::StartBonusAnswer => "start-bonus-answer",
            Self::Ping => "ping",
        }
    }
}
