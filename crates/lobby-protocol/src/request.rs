//! Typed client -> server requests.
//!
//! The server looks up the sender by field 0, so every lobby request carries
//! the session's player id there. Two requests are exceptions:
//! - the identification message, which is sent before an id exists
//!   (`1;_player_nickname;<nickname>`);
//! - the keepalive, which is a bare `get_games`.
//!
//! # Examples
//!
//! ```
//! use lobby_protocol::ClientRequest;
//!
//! let identify = ClientRequest::Identify { nickname: "alice".into() };
//! assert_eq!(identify.to_message("").unwrap().raw(), "1;_player_nickname;alice");
//!
//! let join = ClientRequest::JoinGame { game_id: "7".into() };
//! assert_eq!(join.to_message("42").unwrap().raw(), "42;join_player_to_game;7");
//! ```

use crate::Message;
use lobby_core::{
    Result,
    constants::{
        CMD_CREATE_NEW_GAME, CMD_DISCONNECT_PLAYER, CMD_DISCONNECT_PLAYER_FROM_GAME,
        CMD_GAME_CHOICE_SELECTED, CMD_GET_GAMES, CMD_JOIN_PLAYER_TO_GAME, CMD_PLAYER_NICKNAME,
        IDENTIFY_PREFIX,
    },
};

/// Requests the client can send to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    /// Handshake identification.
    Identify { nickname: String },

    /// Bare `get_games`, sent after the handshake and after a read timeout.
    Keepalive,

    /// Ask for a fresh lobby game list.
    ListGames,

    /// Create a game with a goal score.
    CreateGame { goal: u32 },

    /// Join a listed game.
    JoinGame { game_id: String },

    /// Leave a game.
    LeaveGame { game_id: String },

    /// Record a turn choice in the active game.
    SelectChoice { choice: u32 },

    /// Leave the server.
    Leave,
}

impl ClientRequest {
    /// The command token of this request.
    pub fn command(&self) -> &'static str {
        match self {
            ClientRequest::Identify { .. } => CMD_PLAYER_NICKNAME,
            ClientRequest::Keepalive | ClientRequest::ListGames => CMD_GET_GAMES,
            ClientRequest::CreateGame { .. } => CMD_CREATE_NEW_GAME,
            ClientRequest::JoinGame { .. } => CMD_JOIN_PLAYER_TO_GAME,
            ClientRequest::LeaveGame { .. } => CMD_DISCONNECT_PLAYER_FROM_GAME,
            ClientRequest::SelectChoice { .. } => CMD_GAME_CHOICE_SELECTED,
            ClientRequest::Leave => CMD_DISCONNECT_PLAYER,
        }
    }

    /// Build the wire message, using `player_id` as field 0 where needed.
    ///
    /// # Errors
    /// Returns `Error::InvalidField` if a field contains `;` or a line break.
    pub fn to_message(&self, player_id: &str) -> Result<Message> {
        let command = self.command();
        match self {
            ClientRequest::Identify { nickname } => {
                Message::from_fields([IDENTIFY_PREFIX, command, nickname.as_str()])
            }
            ClientRequest::Keepalive => Message::from_fields([command]),
            ClientRequest::ListGames | ClientRequest::Leave => {
                Message::from_fields([player_id, command])
            }
            ClientRequest::CreateGame { goal } => {
                Message::from_fields([player_id, command, goal.to_string().as_str()])
            }
            ClientRequest::JoinGame { game_id } | ClientRequest::LeaveGame { game_id } => {
                Message::from_fields([player_id, command, game_id.as_str()])
            }
            ClientRequest::SelectChoice { choice } => {
                Message::from_fields([player_id, command, choice.to_string().as_str()])
            }
        }
    }
}
