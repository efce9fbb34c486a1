//! Common test utilities for lobby-network integration tests.
//!
//! - [`MockServer`] / [`Peer`]: a scripted lobby server on a loopback port
//! - [`RecordingView`]: a view controller that records every call
//! - [`connected`]: a client that already completed the handshake
//!
//! Every read on the server side is bounded so a broken client fails the
//! test instead of hanging it.

#![allow(dead_code)]

use lobby_core::{AlphanumericPolicy, Game, Player};
use lobby_network::{
    ClientConfig, CurrentView, Foreground, GameView, LobbyClient, LobbyView, Notice,
    ViewController, ViewKind,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Upper bound for any single step a test waits on.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Short timeouts for liveness tests.
pub fn fast_config(read_timeout_ms: u64) -> ClientConfig {
    ClientConfig::default()
        .with_read_timeout(Duration::from_millis(read_timeout_ms))
        .with_connect_timeout(Duration::from_millis(1000))
        .with_write_timeout(Duration::from_millis(500))
        .with_disconnect_delay(Duration::from_millis(50))
}

pub struct MockServer {
    listener: TcpListener,
    pub addr: SocketAddr,
}

impl MockServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        Self { listener, addr }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn accept(&self) -> Peer {
        let (stream, _) = tokio::time::timeout(STEP_TIMEOUT, self.listener.accept())
            .await
            .expect("accept timeout")
            .unwrap();
        let (read, writer) = stream.into_split();
        Peer {
            lines: BufReader::new(read).lines(),
            writer,
        }
    }
}

/// Server side of one accepted connection
pub struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Peer {
    /// Next line from the client, `None` on EOF.
    pub async fn read_line(&mut self) -> Option<String> {
        tokio::time::timeout(STEP_TIMEOUT, self.lines.next_line())
            .await
            .expect("read timeout")
            .unwrap()
    }

    /// Next line, or `None` if nothing arrives within `wait`.
    pub async fn try_read_line(&mut self, wait: Duration) -> Option<String> {
        match tokio::time::timeout(wait, self.lines.next_line()).await {
            Ok(Ok(line)) => line,
            _ => None,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Answer the identification request with `id` and return the request.
    pub async fn handshake(&mut self, id: &str) -> String {
        let identify = self.read_line().await.expect("no identification");
        self.send(&format!("{id};_player_id")).await;
        identify
    }
}

/// A client connected to a mock server that replied with `id`.
///
/// The initial `get_games` is left unread on the peer.
pub async fn connected(config: ClientConfig, id: &str) -> (LobbyClient, Foreground, Peer) {
    let server = MockServer::bind().await;
    let port = server.port();
    let id = id.to_string();
    let peer = tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.handshake(&id).await;
        peer
    });

    let (client, foreground) = LobbyClient::new(config, AlphanumericPolicy::default());
    client.connect("127.0.0.1", port, "alice").await.unwrap();
    (client, foreground, peer.await.unwrap())
}

#[derive(Debug, Default)]
pub struct Screens {
    pub game_lists: Vec<Vec<Game>>,
    pub player_lists: Vec<Vec<Player>>,
    pub game: Option<Game>,
}

impl LobbyView for Screens {
    fn populate_games(&mut self, games: Vec<Game>) {
        self.game_lists.push(games);
    }
}

impl GameView for Screens {
    fn update_players(&mut self, players: Vec<Player>) {
        self.player_lists.push(players);
    }

    fn set_game(&mut self, game: Game) {
        self.game = Some(game);
    }
}

/// View controller that records every call
#[derive(Debug)]
pub struct RecordingView {
    pub current: Option<ViewKind>,
    pub loaded: Vec<ViewKind>,
    pub notices: Vec<Notice>,
    pub screens: Screens,
}

impl RecordingView {
    pub fn new(current: ViewKind) -> Self {
        Self {
            current: Some(current),
            loaded: Vec::new(),
            notices: Vec::new(),
            screens: Screens::default(),
        }
    }
}

impl ViewController for RecordingView {
    fn load_view(&mut self, kind: ViewKind) {
        self.current = Some(kind);
        self.loaded.push(kind);
    }

    fn current_view(&mut self) -> CurrentView<'_> {
        match self.current {
            Some(ViewKind::ConnectionForm) => CurrentView::ConnectionForm,
            Some(ViewKind::Lobby) => CurrentView::Lobby(&mut self.screens),
            Some(ViewKind::Game) => CurrentView::Game(&mut self.screens),
            None => CurrentView::None,
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
