//! Room client configuration
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | QUIZREADER_SERVER_URL | ws://localhost:3000/play/mp | Multiplayer WebSocket endpoint. |
//! | QUIZREADER_KEEPALIVE_SECS | 30 | Interval between `ping` actions. |

use crate::error::{RoomError, RoomResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_server_url() -> String {
    "ws://localhost:3000/play/mp".to_string()
}

fn default_keepalive_interval() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// WebSocket endpoint (`ws://` or `wss://`)
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Heartbeat period for the life of a connection
    #[serde(default = "default_keepalive_interval", with = "duration_secs")]
    pub keepalive_interval: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}

impl RoomConfig {
    /// Load from environment. Unset or invalid => defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_url: env_opt_string("QUIZREADER_SERVER_URL").unwrap_or(defaults.server_url),
            keepalive_interval: env_opt_string("QUIZREADER_KEEPALIVE_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.keepalive_interval),
        }
    }

    pub fn validate(&self) -> RoomResult<()> {
        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            return Err(RoomError::Config(format!(
                "server_url must be a ws:// or wss:// URL, got '{}'",
                self.server_url
            )));
        }
        if self.keepalive_interval.is_zero() {
            return Err(RoomError::Config(
                "keepalive_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection URL carrying the room name, user id and username as query parameters.
    pub fn connection_url(
        &self,
        room_name: &str,
        user_id: &str,
        username: &str,
    ) -> RoomResult<String> {
        self.validate()?;
        let separator = if self.server_url.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}roomName={}&userId={}&username={}",
            self.server_url,
            separator,
            urlencoding::encode(room_name),
            urlencoding::encode(user_id),
            urlencoding::encode(username),
        ))
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_query_parameters() {
        let config = RoomConfig {
            server_url: "ws://example.test/play/mp".into(),
            ..RoomConfig::default()
        };
        let url = config
            .connection_url("lit & hist", "u-1", "Ann Lee")
            .unwrap();
        assert_eq!(
            url,
            "ws://example.test/play/mp?roomName=lit%20%26%20hist&userId=u-1&username=Ann%20Lee"
        );
    }

    #[test]
    fn url_appends_to_existing_query() {
        let config = RoomConfig {
            server_url: "wss://example.test/mp?v=2".into(),
            ..RoomConfig::default()
        };
        let url = config.connection_url("r", "u", "n").unwrap();
        assert_eq!(url, "wss://example.test/mp?v=2&roomName=r&userId=u&username=n");
    }

    #[test]
    fn non_websocket_url_is_rejected() {
        let config = RoomConfig {
            server_url: "http://example.test".into(),
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(config.connection_url("r", "u", "n").is_err());
    }

    #[test]
    fn default_keepalive_is_thirty_seconds() {
        assert_eq!(RoomConfig::default().keepalive_interval, Duration::from_secs(30));
        assert!(RoomConfig::default().validate().is_ok());
    }
}
