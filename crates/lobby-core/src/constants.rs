//! Core constants for the lobby wire protocol.
//!
//! This module defines the protocol-level constants shared by the codec,
//! the dispatcher and the connection manager, so that every layer agrees on
//! delimiters, command tokens, identity limits and timing defaults.
//!
//! # Protocol Structure
//!
//! Every message is one line of text, with fields separated by `;`:
//!
//! ```text
//! <field0>;<command>;<field2>;<field3>;...\n
//! ```
//!
//! Where:
//! - `field0` - Player id (server assigns meaning, ignored by the client on inbound lines)
//! - `command` - Command token (see the `CMD_*` constants)
//! - `field2..` - Command-specific payload
//! - `\n` - Line terminator, one message per line
//!
//! There is no escaping: a field can never contain `;` or a line break.
//!
//! # Usage
//!
//! ```
//! use lobby_core::constants::*;
//!
//! let line = format!("1{FIELD_DELIMITER}{CMD_PLAYER_NICKNAME}{FIELD_DELIMITER}alice");
//! assert_eq!(line, "1;_player_nickname;alice");
//! assert_eq!(MAX_NICKNAME_LENGTH, 20);
//! ```

// ============================================================================
// Delimiters
// ============================================================================

/// Field separator in protocol messages.
///
/// Empty fields (consecutive `;;`) are preserved by the codec.
///
/// # Examples
///
/// ```
/// use lobby_core::constants::FIELD_DELIMITER;
///
/// let fields: Vec<&str> = "x;update_games;Chess;42;5".split(FIELD_DELIMITER).collect();
/// assert_eq!(fields.len(), 5);
/// ```
pub const FIELD_DELIMITER: char = ';';

/// Message terminator. Exactly one message is carried per line.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Optional carriage return stripped before the terminator.
pub const CARRIAGE_RETURN: u8 = b'\r';

/// Index of the command token in a decoded message.
pub const COMMAND_INDEX: usize = 1;

/// Index of the first payload field in a decoded command message.
pub const PAYLOAD_INDEX: usize = 2;

// ============================================================================
// Handshake
// ============================================================================

/// Reserved value sent in field 0 of the identification message.
pub const IDENTIFY_PREFIX: &str = "1";

/// Client -> server identification token: `1;_player_nickname;<nickname>`.
pub const CMD_PLAYER_NICKNAME: &str = "_player_nickname";

/// Server -> client identification reply token: `<id>;_player_id`.
pub const CMD_PLAYER_ID: &str = "_player_id";

// ============================================================================
// Client -> Server Commands
// ============================================================================

/// Keepalive and lobby refresh request.
///
/// Also sent bare as the keepalive after a read timeout.
pub const CMD_GET_GAMES: &str = "get_games";

/// Create a new game with a goal score: `<id>;create_new_game;<goal>`.
pub const CMD_CREATE_NEW_GAME: &str = "create_new_game";

/// Join a game from the lobby: `<id>;join_player_to_game;<game_id>`.
pub const CMD_JOIN_PLAYER_TO_GAME: &str = "join_player_to_game";

/// Leave the current game: `<id>;disconnect_player_from_game;<game_id>`.
pub const CMD_DISCONNECT_PLAYER_FROM_GAME: &str = "disconnect_player_from_game";

/// Record a turn choice: `<id>;game_choice_selected;<choice>`.
pub const CMD_GAME_CHOICE_SELECTED: &str = "game_choice_selected";

// ============================================================================
// Server -> Client Commands
// ============================================================================

/// Player list of the active game, as `(id, nickname, color)` triples.
pub const CMD_UPDATE_PLAYERS: &str = "update_players";

/// Lobby game list, as `(name, id, goal)` triples.
pub const CMD_UPDATE_GAMES: &str = "update_games";

/// The player joined a game: `game_id`, `game_name` and `game_goal`.
pub const CMD_PREPARE_WINDOW_FOR_GAME: &str = "prepare_window_for_game";

/// Server-initiated disconnect. Also sent by the client to leave the server.
pub const CMD_DISCONNECT_PLAYER: &str = "disconnect_player";

// ============================================================================
// Identity Limits
// ============================================================================

/// Maximum stored nickname length, in characters, after trimming.
///
/// Longer nicknames are truncated, never rejected.
///
/// # Examples
///
/// ```
/// use lobby_core::constants::MAX_NICKNAME_LENGTH;
///
/// let nick: String = "abcdefghijklmnopqrstuvwxyz".chars().take(MAX_NICKNAME_LENGTH).collect();
/// assert_eq!(nick, "abcdefghijklmnopqrst");
/// ```
pub const MAX_NICKNAME_LENGTH: usize = 20;

/// Maximum stored host address length, in characters, after trimming.
pub const MAX_HOST_LENGTH: usize = 15;

// ============================================================================
// Timeout Configuration
// ============================================================================

/// Default socket read timeout (milliseconds).
///
/// Bounds the handshake read and every receive loop cycle. A cycle that
/// times out counts as one missed liveness check.
///
/// # Value: 15000ms (15 seconds)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 15_000;

/// Default timeout for establishing the TCP connection (milliseconds).
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 15_000;

/// Default timeout for a single outgoing write (milliseconds).
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 3_000;

/// Default number of consecutive read timeouts that mark the server as lost.
///
/// The first timeout sends a keepalive. Reaching this count ends the
/// receive loop with a lost connection notice.
pub const DEFAULT_MAX_MISSED_TIMEOUTS: u32 = 2;

/// Default delay between switching to the connection form and tearing down
/// the connection after a server-initiated disconnect (milliseconds).
pub const DEFAULT_DISCONNECT_DELAY_MS: u64 = 1_000;

/// Timeout applied to flush and shutdown while closing (milliseconds).
pub const CLOSE_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Buffer Limits
// ============================================================================

/// Default maximum accepted line length in bytes (8 KB).
///
/// Longer lines are discarded by the codec, which resynchronises at the
/// next line terminator.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;
