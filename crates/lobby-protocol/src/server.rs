//! Typed server -> client messages.
//!
//! A decoded [`Message`] is turned into a [`ServerMessage`] by matching its
//! command token (field 1). Field 0 is ignored for command messages.
//!
//! # Payload Rules
//!
//! - Every payload field is trimmed.
//! - Trailing empty fields are ignored, so `x;update_games;Chess;42;5;` has
//!   one game.
//! - List payloads are groups of three fields. A single stray field after the
//!   last group is dropped, two leftover fields reject the whole message.
//!
//! # Examples
//!
//! ```
//! use lobby_protocol::{Message, ServerMessage};
//!
//! let msg = Message::new("x;update_games;Chess;42;5");
//! match ServerMessage::try_from(&msg).unwrap() {
//!     ServerMessage::UpdateGames(games) => {
//!         assert_eq!(games[0].name, "Chess");
//!         assert_eq!(games[0].id, "42");
//!         assert_eq!(games[0].goal, 5);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use crate::Message;
use lobby_core::{
    Color, Error, Game, Player, Result,
    constants::{
        CMD_DISCONNECT_PLAYER, CMD_PLAYER_ID, CMD_PREPARE_WINDOW_FOR_GAME, CMD_UPDATE_GAMES,
        CMD_UPDATE_PLAYERS, COMMAND_INDEX, PAYLOAD_INDEX,
    },
};
use tracing::debug;

/// Command messages the client accepts from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Players of the active game.
    UpdatePlayers(Vec<Player>),

    /// Games listed in the lobby.
    UpdateGames(Vec<Game>),

    /// The player joined a game and the game view should be shown.
    PrepareWindowForGame(Game),

    /// The server ended the session.
    DisconnectPlayer,
}

impl ServerMessage {
    /// The command token of this message.
    pub fn command(&self) -> &'static str {
        match self {
            ServerMessage::UpdatePlayers(_) => CMD_UPDATE_PLAYERS,
            ServerMessage::UpdateGames(_) => CMD_UPDATE_GAMES,
            ServerMessage::PrepareWindowForGame(_) => CMD_PREPARE_WINDOW_FOR_GAME,
            ServerMessage::DisconnectPlayer => CMD_DISCONNECT_PLAYER,
        }
    }
}

impl TryFrom<&Message> for ServerMessage {
    type Error = Error;

    fn try_from(message: &Message) -> Result<Self> {
        let fields = message.fields();
        let command = fields.get(COMMAND_INDEX).ok_or_else(|| {
            Error::MalformedMessage(format!("no command token in '{message}'"))
        })?;
        let payload = payload(&fields);

        match command.trim() {
            CMD_UPDATE_PLAYERS => parse_players(&payload).map(ServerMessage::UpdatePlayers),
            CMD_UPDATE_GAMES => parse_games(&payload).map(ServerMessage::UpdateGames),
            CMD_PREPARE_WINDOW_FOR_GAME => {
                parse_prepared_game(&payload).map(ServerMessage::PrepareWindowForGame)
            }
            CMD_DISCONNECT_PLAYER => Ok(ServerMessage::DisconnectPlayer),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}

/// Parse the identification reply `<id>;_player_id` and return the id.
///
/// # Errors
///
/// Returns `Error::MalformedMessage` if the reply has fewer than two fields,
/// a different token, or an empty id.
///
/// # Example
///
/// ```
/// use lobby_protocol::{Message, parse_identity_reply};
///
/// assert_eq!(parse_identity_reply(&Message::new(" 1804289383 ;_player_id")).unwrap(), "1804289383");
/// assert!(parse_identity_reply(&Message::new("1804289383;kick_player")).is_err());
/// ```
pub fn parse_identity_reply(message: &Message) -> Result<String> {
    let fields = message.fields();
    if fields.len() < 2 || fields[COMMAND_INDEX].trim() != CMD_PLAYER_ID {
        return Err(Error::MalformedMessage(format!(
            "expected '<id>;{CMD_PLAYER_ID}', got '{message}'"
        )));
    }

    let id = fields[0].trim();
    if id.is_empty() {
        return Err(Error::MalformedMessage(format!("empty player id in '{message}'")));
    }
    Ok(id.to_string())
}

/// Trimmed payload fields, without trailing empty fields.
fn payload<'a>(fields: &[&'a str]) -> Vec<&'a str> {
    let mut payload: Vec<&str> = fields
        .iter()
        .skip(PAYLOAD_INDEX)
        .map(|f| f.trim())
        .collect();
    while payload.last().is_some_and(|f| f.is_empty()) {
        payload.pop();
    }
    payload
}

fn triples<'p, 'a>(
    payload: &'p [&'a str],
    what: &str,
) -> Result<impl Iterator<Item = &'p [&'a str]>> {
    match payload.len() % 3 {
        0 => {}
        1 => debug!(
            stray = payload[payload.len() - 1],
            "Ignoring trailing field after last {} entry", what
        ),
        _ => {
            return Err(Error::MalformedMessage(format!(
                "incomplete {what} entry: {} payload fields",
                payload.len()
            )));
        }
    }
    Ok(payload.chunks_exact(3))
}

fn parse_number(field: &str, value: &str) -> Result<i32> {
    value.parse().map_err(|_| Error::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// `(id, nickname, color)` triples.
fn parse_players(payload: &[&str]) -> Result<Vec<Player>> {
    triples(payload, "player")?
        .map(|entry| -> Result<Player> {
            let color: Color = entry[2].parse()?;
            Ok(Player::new(entry[0], entry[1], color))
        })
        .collect()
}

/// `(name, id, goal)` triples.
fn parse_games(payload: &[&str]) -> Result<Vec<Game>> {
    triples(payload, "game")?
        .map(|entry| -> Result<Game> {
            Ok(Game::new(entry[1], entry[0], parse_number("goal", entry[2])?))
        })
        .collect()
}

/// `game_id, game_name, game_goal` at fixed positions.
fn parse_prepared_game(payload: &[&str]) -> Result<Game> {
    let field = |index: usize, name: &str| {
        payload
            .get(index)
            .copied()
            .ok_or_else(|| Error::MissingField(name.to_string()))
    };

    let id = field(0, "game_id")?;
    let name = field(1, "game_name")?;
    let goal = parse_number("game_goal", field(2, "game_goal")?)?;
    Ok(Game::new(id, name, goal))
}
