//! Nickname sanitation policy.
//!
//! The connection manager refuses to identify with a nickname the policy
//! rejects. The policy is a trait so the composing application can supply
//! its own rules. [`AlphanumericPolicy`] is the default: letters and digits,
//! plus an optional set of extra characters.
//!
//! Custom policies should reject anything [`contains_reserved`] flags, since
//! those characters would break the wire format.

use crate::constants::FIELD_DELIMITER;

/// Decides whether a trimmed nickname may be sent to the server.
pub trait NicknamePolicy: Send + Sync {
    /// Returns `true` if `nickname` is acceptable.
    fn is_acceptable(&self, nickname: &str) -> bool;
}

/// Returns `true` if `value` contains a character reserved by the wire format.
pub fn contains_reserved(value: &str) -> bool {
    value
        .chars()
        .any(|c| c == FIELD_DELIMITER || c == '\n' || c == '\r')
}

/// Accepts nicknames made of alphanumeric characters.
///
/// # Examples
///
/// ```
/// use lobby_core::{AlphanumericPolicy, NicknamePolicy};
///
/// let policy = AlphanumericPolicy::default();
/// assert!(policy.is_acceptable("Player1"));
/// assert!(!policy.is_acceptable("bad;name"));
///
/// let relaxed = AlphanumericPolicy::with_extra(['_', '-', ' ']);
/// assert!(relaxed.is_acceptable("cool_player-2"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AlphanumericPolicy {
    extra: Vec<char>,
}

impl AlphanumericPolicy {
    /// Allow `extra` characters on top of letters and digits.
    ///
    /// Reserved protocol characters stay rejected even if listed here.
    pub fn with_extra(extra: impl IntoIterator<Item = char>) -> Self {
        AlphanumericPolicy {
            extra: extra.into_iter().collect(),
        }
    }
}

impl NicknamePolicy for AlphanumericPolicy {
    fn is_acceptable(&self, nickname: &str) -> bool {
        !nickname.is_empty()
            && !contains_reserved(nickname)
            && nickname
                .chars()
                .all(|c| c.is_alphanumeric() || self.extra.contains(&c))
    }
}
