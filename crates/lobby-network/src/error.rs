use thiserror::Error;

/// Result code of a successful [`connect`](crate::LobbyClient::connect).
pub const CONNECT_OK: i32 = 0;

/// Errors returned by [`LobbyClient::connect`](crate::LobbyClient::connect)
///
/// Each variant maps to one of the numeric result codes through
/// [`ConnectError::code`].
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Blank host, blank nickname or a nickname the policy rejects
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The TCP connection could not be opened
    #[error("Socket failure: {0}")]
    SocketFailure(#[source] std::io::Error),

    /// The TCP connection was not opened in time
    #[error("Connection timeout after {0}ms")]
    ConnectTimeout(u64),

    /// The identification exchange failed
    #[error("Handshake failed: {0}")]
    ProtocolFailure(String),
}

impl ConnectError {
    /// Numeric result code: `1` socket failure, `2` invalid input,
    /// `3` handshake failure.
    pub fn code(&self) -> i32 {
        match self {
            ConnectError::SocketFailure(_) | ConnectError::ConnectTimeout(_) => 1,
            ConnectError::InvalidInput(_) => 2,
            ConnectError::ProtocolFailure(_) => 3,
        }
    }
}

/// Numeric result code of a connect attempt, `0` on success.
///
/// ```
/// use lobby_network::{ConnectError, result_code};
///
/// assert_eq!(result_code(&Ok(())), 0);
/// assert_eq!(result_code(&Err(ConnectError::InvalidInput("blank".into()))), 2);
/// ```
pub fn result_code(result: &Result<(), ConnectError>) -> i32 {
    match result {
        Ok(()) => CONNECT_OK,
        Err(e) => e.code(),
    }
}

/// Errors that can occur while talking to a connected server
#[derive(Debug, Error)]
pub enum ClientError {
    /// No connection is attached
    #[error("Not connected to server")]
    NotConnected,

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Protocol-level error from LobbyCodec
    #[error("Protocol error: {0}")]
    Protocol(#[from] lobby_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
