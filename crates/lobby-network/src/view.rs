//! View controller capability and foreground event delivery.
//!
//! The library never touches UI state from the receive loop. The dispatcher
//! and the receive loop push [`ViewEvent`]s onto a FIFO queue, and whoever
//! owns the view drains that queue through [`Foreground`] on its own task.
//!
//! ```text
//! Receive Loop ──> Dispatcher ──> ViewEvent queue ──> Foreground::apply ──> ViewController
//!      (tokio task)                  (epoch tagged)        (UI context)
//! ```
//!
//! Every event carries the epoch of the connection that produced it. Events
//! from an older connection are dropped when they reach the foreground.

use crate::LobbyClient;
use lobby_core::{Game, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::{debug, info, trace, warn};

/// Views the client can switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    ConnectionForm,
    Lobby,
    Game,
}

/// Lobby screen: the list of open games
pub trait LobbyView {
    fn populate_games(&mut self, games: Vec<Game>);
}

/// Game screen: the players of the active game
pub trait GameView {
    fn update_players(&mut self, players: Vec<Player>);
    fn set_game(&mut self, game: Game);
}

/// The view currently shown, as seen by the foreground
pub enum CurrentView<'a> {
    ConnectionForm,
    Lobby(&'a mut dyn LobbyView),
    Game(&'a mut dyn GameView),
    None,
}

impl CurrentView<'_> {
    pub fn kind(&self) -> Option<ViewKind> {
        match self {
            CurrentView::ConnectionForm => Some(ViewKind::ConnectionForm),
            CurrentView::Lobby(_) => Some(ViewKind::Lobby),
            CurrentView::Game(_) => Some(ViewKind::Game),
            CurrentView::None => None,
        }
    }
}

impl fmt::Debug for CurrentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "CurrentView::{kind:?}"),
            None => f.write_str("CurrentView::None"),
        }
    }
}

/// User-facing alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    LostConnection,
    UnexpectedServerError,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::LostConnection => "Lost connection to the server!",
            Notice::UnexpectedServerError => "An unexpected error occurred on the server!",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The narrow UI capability the client needs.
///
/// Implementations are only ever called from [`Foreground`], so they do not
/// need to be `Send`.
pub trait ViewController {
    /// Switch the displayed view.
    fn load_view(&mut self, kind: ViewKind);

    /// The view currently displayed.
    fn current_view(&mut self) -> CurrentView<'_>;

    /// Show an alert to the user.
    fn notify(&mut self, notice: Notice);
}

/// Work for the foreground, produced by the receive loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Forwarded to the game view only
    PlayersUpdated(Vec<Player>),

    /// Forwarded to the lobby view only
    GamesUpdated(Vec<Game>),

    /// Load the game view for this game
    EnterGame(Game),

    /// The server sent `disconnect_player`
    ServerDisconnected,

    /// Missed too many reads or the server closed the stream
    ConnectionLost,

    /// The connection failed with an I/O error
    ServerError,
}

#[derive(Debug)]
pub(crate) struct TaggedEvent {
    epoch: u64,
    event: ViewEvent,
}

impl TaggedEvent {
    #[cfg(test)]
    pub(crate) fn into_event(self) -> ViewEvent {
        self.event
    }
}

/// Producer side of the foreground queue, bound to one connection epoch.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: UnboundedSender<TaggedEvent>,
    epoch: u64,
}

impl EventSink {
    pub(crate) fn new(tx: UnboundedSender<TaggedEvent>, epoch: u64) -> Self {
        Self { tx, epoch }
    }

    pub(crate) fn emit(&self, event: ViewEvent) {
        trace!(epoch = self.epoch, ?event, "Queueing view event");
        if let Err(e) = self.tx.send(TaggedEvent {
            epoch: self.epoch,
            event,
        }) {
            debug!(event = ?e.0.event, "Foreground is gone, dropping view event");
        }
    }
}

/// Consumer of view events, owned by the UI context.
///
/// Obtained from [`LobbyClient::new`]. There is exactly one per client.
pub struct Foreground {
    events: UnboundedReceiver<TaggedEvent>,
    client: LobbyClient,
    /// Epoch of the last event handed out
    delivered: AtomicU64,
}

impl Foreground {
    pub(crate) fn new(events: UnboundedReceiver<TaggedEvent>, client: LobbyClient) -> Self {
        let delivered = AtomicU64::new(client.session_handle().epoch());
        Self {
            events,
            client,
            delivered,
        }
    }

    pub fn client(&self) -> &LobbyClient {
        &self.client
    }

    fn is_current(&self, tagged: &TaggedEvent) -> bool {
        let epoch = self.client.session_handle().epoch();
        if tagged.epoch == epoch {
            self.delivered.store(epoch, Ordering::Relaxed);
            return true;
        }
        debug!(
            event_epoch = tagged.epoch,
            current_epoch = epoch,
            event = ?tagged.event,
            "Dropping view event from a previous connection"
        );
        false
    }

    /// Wait for the next event of the current connection.
    ///
    /// Returns `None` once every producer is gone.
    pub async fn next_event(&mut self) -> Option<ViewEvent> {
        loop {
            let tagged = self.events.recv().await?;
            if self.is_current(&tagged) {
                return Some(tagged.event);
            }
        }
    }

    /// Take the next ready event of the current connection without waiting.
    pub fn try_next_event(&mut self) -> Option<ViewEvent> {
        loop {
            match self.events.try_recv() {
                Ok(tagged) if self.is_current(&tagged) => return Some(tagged.event),
                Ok(_) => continue,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Perform the view calls for one event.
    ///
    /// Connection failures switch to the connection form, alert the user and
    /// tear the connection down before returning. A failure whose connection
    /// was replaced after the event was delivered is ignored.
    pub async fn apply<V>(&self, view: &mut V, event: ViewEvent)
    where
        V: ViewController + ?Sized,
    {
        match event {
            ViewEvent::PlayersUpdated(players) => match view.current_view() {
                CurrentView::Game(game) => game.update_players(players),
                other => debug!(view = ?other, "Not in the game view, ignoring player update"),
            },
            ViewEvent::GamesUpdated(games) => match view.current_view() {
                CurrentView::Lobby(lobby) => lobby.populate_games(games),
                other => debug!(view = ?other, "Not in the lobby view, ignoring game list"),
            },
            ViewEvent::EnterGame(game) => {
                info!(game_id = %game.id, name = %game.name, "Entering game");
                view.load_view(ViewKind::Game);
                match view.current_view() {
                    CurrentView::Game(game_view) => game_view.set_game(game),
                    other => warn!(view = ?other, "Game view did not load"),
                }
            }
            ViewEvent::ServerDisconnected => {
                let Some(epoch) = self.live_epoch() else {
                    return;
                };
                info!("Server ended the session");
                view.load_view(ViewKind::ConnectionForm);
                self.client.disconnect_later(epoch);
            }
            ViewEvent::ConnectionLost => {
                self.fail(view, Notice::LostConnection).await;
            }
            ViewEvent::ServerError => {
                self.fail(view, Notice::UnexpectedServerError).await;
            }
        }
    }

    async fn fail<V>(&self, view: &mut V, notice: Notice)
    where
        V: ViewController + ?Sized,
    {
        let Some(epoch) = self.live_epoch() else {
            return;
        };
        warn!(%notice, "Connection failed");
        view.load_view(ViewKind::ConnectionForm);
        view.notify(notice);
        self.client.disconnect_epoch(epoch).await;
    }

    /// The delivered epoch, if its connection is still the current one.
    fn live_epoch(&self) -> Option<u64> {
        let delivered = self.delivered.load(Ordering::Relaxed);
        let current = self.client.session_handle().epoch();
        if delivered == current {
            return Some(delivered);
        }
        debug!(delivered, current, "Connection replaced, ignoring its failure");
        None
    }

    /// Apply every ready event without waiting. Returns how many were applied.
    pub async fn drain<V>(&mut self, view: &mut V) -> usize
    where
        V: ViewController + ?Sized,
    {
        let mut applied = 0;
        while let Some(event) = self.try_next_event() {
            self.apply(view, event).await;
            applied += 1;
        }
        applied
    }

    /// Apply events as they arrive until every producer is gone.
    pub async fn run<V>(&mut self, view: &mut V)
    where
        V: ViewController + ?Sized,
    {
        while let Some(event) = self.next_event().await {
            self.apply(view, event).await;
        }
    }
}

impl fmt::Debug for Foreground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Foreground").finish_non_exhaustive()
    }
}
