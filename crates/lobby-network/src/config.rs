//! Client configuration.

use lobby_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DISCONNECT_DELAY_MS, DEFAULT_MAX_LINE_LENGTH,
    DEFAULT_MAX_MISSED_TIMEOUTS, DEFAULT_READ_TIMEOUT_MS, DEFAULT_WRITE_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`LobbyClient`](crate::LobbyClient)
///
/// # Example
///
/// ```
/// use lobby_network::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_read_timeout(Duration::from_secs(5))
///     .with_max_missed_timeouts(3);
///
/// assert_eq!(config.read_timeout, Duration::from_secs(5));
/// assert_eq!(config.write_timeout, Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bound on every read: the handshake reply and each receive cycle
    pub read_timeout: Duration,

    /// Bound on opening the TCP connection
    pub connect_timeout: Duration,

    /// Bound on each outbound write
    pub write_timeout: Duration,

    /// Consecutive read timeouts after which the connection counts as lost
    pub max_missed_timeouts: u32,

    /// Pause between showing the connection form and tearing the connection
    /// down after the server sends `disconnect_player`
    pub disconnect_delay: Duration,

    /// Longest inbound line accepted by the codec
    pub max_line_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            max_missed_timeouts: DEFAULT_MAX_MISSED_TIMEOUTS,
            disconnect_delay: Duration::from_millis(DEFAULT_DISCONNECT_DELAY_MS),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_missed_timeouts(mut self, count: u32) -> Self {
        self.max_missed_timeouts = count.max(1);
        self
    }

    #[must_use]
    pub fn with_disconnect_delay(mut self, delay: Duration) -> Self {
        self.disconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.read_timeout.as_millis(), 15000);
        assert_eq!(config.connect_timeout.as_millis(), 15000);
        assert_eq!(config.write_timeout.as_millis(), 3000);
        assert_eq!(config.max_missed_timeouts, 2);
        assert_eq!(config.disconnect_delay.as_millis(), 1000);
        assert_eq!(config.max_line_length, 8192);
    }

    #[test]
    fn test_missed_timeouts_floor() {
        let config = ClientConfig::default().with_max_missed_timeouts(0);
        assert_eq!(config.max_missed_timeouts, 1);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"max_missed_timeouts": 4}"#).unwrap();
        assert_eq!(config.max_missed_timeouts, 4);
        assert_eq!(config.read_timeout, ClientConfig::default().read_timeout);
    }
}
