//! Session state shared between the connection manager, the receive loop
//! and the foreground.
//!
//! [`Session`] is a plain snapshot. [`SharedSession`] is the live copy behind
//! a mutex. Writes are crate-private and narrow: the connection manager owns
//! the identity fields, the dispatcher may only touch `game_id` and reset the
//! timeout counter, and the receive loop may only count timeouts.

use lobby_core::{HostAddress, Nickname};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Connection lifecycle state
///
/// `Disconnected -> Connecting -> Handshaking -> Connected -> Disconnected`.
/// Any failure before `Connected` goes straight back to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Handshaking,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Handshaking => "handshaking",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Snapshot of the client session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Player id assigned by the server, empty until the handshake succeeds
    pub id: String,

    /// Trimmed nickname, at most 20 characters
    pub nickname: String,

    /// Trimmed host, at most 15 characters
    pub host_address: String,

    pub port: u16,

    /// Id of the game the player was placed in, empty in the lobby
    pub game_id: String,

    /// Consecutive read timeouts since the last lobby update
    pub timeout_count: u32,

    pub connected: bool,

    pub state: ConnectionState,

    /// Connection generation, bumped on every connect and disconnect
    pub epoch: u64,
}

impl Session {
    /// Clear identity and connection fields. `epoch` is kept.
    fn clear(&mut self) {
        let epoch = self.epoch;
        *self = Session {
            epoch,
            ..Session::default()
        };
    }
}

/// Live session shared across tasks
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    // Session is plain data, a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        let mut session = self.lock();
        if session.state != state {
            debug!(from = %session.state, to = %state, "Connection state transition");
            session.state = state;
        }
    }

    /// Record the identity of a connection attempt and enter `Connecting`.
    pub(crate) fn begin_connect(&self, host: &HostAddress, port: u16, nickname: &Nickname) {
        {
            let mut session = self.lock();
            session.clear();
            session.host_address = host.as_str().to_string();
            session.port = port;
            session.nickname = nickname.as_str().to_string();
        }
        self.set_state(ConnectionState::Connecting);
    }

    /// Mark the handshake as complete and return the new epoch.
    pub(crate) fn establish(&self, id: &str) -> u64 {
        let epoch = {
            let mut session = self.lock();
            session.id = id.to_string();
            session.connected = true;
            session.timeout_count = 0;
            session.epoch += 1;
            session.epoch
        };
        self.set_state(ConnectionState::Connected);
        epoch
    }

    /// Return to the fully disconnected state and bump the epoch.
    pub(crate) fn reset(&self) -> u64 {
        let epoch = {
            let mut session = self.lock();
            session.clear();
            session.epoch += 1;
            session.epoch
        };
        debug!(epoch, "Session reset");
        self.set_state(ConnectionState::Disconnected);
        epoch
    }

    pub(crate) fn set_game_id(&self, game_id: &str) {
        self.lock().game_id = game_id.to_string();
    }

    pub(crate) fn reset_timeouts(&self) {
        self.lock().timeout_count = 0;
    }

    /// Count one missed read and return the new total.
    pub(crate) fn record_timeout(&self) -> u32 {
        let mut session = self.lock();
        session.timeout_count += 1;
        session.timeout_count
    }
}
