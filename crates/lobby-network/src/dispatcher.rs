//! Routes decoded server messages to session updates and view events.
//!
//! | command | effect |
//! |---|---|
//! | `update_players` | `PlayersUpdated` |
//! | `update_games` | resets the timeout counter, `GamesUpdated` |
//! | `prepare_window_for_game` | sets `game_id`, `EnterGame` |
//! | `disconnect_player` | stops the receive loop, `ServerDisconnected` |
//!
//! Anything else is logged and dropped. A bad message never affects the
//! messages after it.

use crate::session::SharedSession;
use crate::view::{EventSink, ViewEvent};
use lobby_core::Error;
use lobby_protocol::{Message, ServerMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct Dispatcher {
    session: SharedSession,
    events: EventSink,
    stop: CancellationToken,
}

impl Dispatcher {
    pub(crate) fn new(session: SharedSession, events: EventSink, stop: CancellationToken) -> Self {
        Self {
            session,
            events,
            stop,
        }
    }

    pub(crate) fn dispatch(&self, message: &Message) {
        match ServerMessage::try_from(message) {
            Ok(parsed) => {
                debug!(command = parsed.command(), "Dispatching server message");
                self.handle(parsed);
            }
            Err(Error::UnknownCommand(command)) => {
                warn!(%command, %message, "Received message does not fit the format");
            }
            Err(Error::MalformedMessage(reason)) => {
                warn!(%reason, %message, "Received malformed message");
            }
            Err(e) => {
                warn!(
                    command = message.command().unwrap_or_default(),
                    error = %e,
                    "Cannot decode message payload"
                );
            }
        }
    }

    fn handle(&self, message: ServerMessage) {
        match message {
            ServerMessage::UpdatePlayers(players) => {
                self.events.emit(ViewEvent::PlayersUpdated(players));
            }
            ServerMessage::UpdateGames(games) => {
                self.session.reset_timeouts();
                self.events.emit(ViewEvent::GamesUpdated(games));
            }
            ServerMessage::PrepareWindowForGame(game) => {
                self.session.set_game_id(&game.id);
                self.events.emit(ViewEvent::EnterGame(game));
            }
            ServerMessage::DisconnectPlayer => {
                self.stop.cancel();
                self.events.emit(ViewEvent::ServerDisconnected);
            }
        }
    }
}
