//! Connection manager for the lobby protocol.
//!
//! [`LobbyClient`] opens the connection, performs the identification
//! handshake, starts the receive loop and tears everything down again. It is
//! a cheap handle: clones share one session, one writer and one connection.
//!
//! # Architecture
//!
//! ```text
//! LobbyClient ──connect()──> TcpStream::into_split
//!     │                          │            │
//!     │                   OwnedWriteHalf  OwnedReadHalf
//!     │                          │            │
//!     ├─> Sender (FramedWrite) <─┘            └─> ReceiveLoop (FramedRead, tokio task)
//!     │                                               │
//!     └─> SharedSession <──── Dispatcher <────────────┘
//!                                 │
//!                                 └─> ViewEvent queue ──> Foreground
//! ```
//!
//! # Handshake
//!
//! 1. Send `1;_player_nickname;<nickname>`
//! 2. Read one line within the read timeout, expecting `<id>;_player_id`
//! 3. Store the id, send `get_games` and start the receive loop
//!
//! Any failure after the socket is open releases it and resets the session.
//!
//! # Example Usage
//!
//! ```no_run
//! use lobby_core::AlphanumericPolicy;
//! use lobby_network::{ClientConfig, LobbyClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, mut foreground) =
//!     LobbyClient::new(ClientConfig::default(), AlphanumericPolicy::default());
//!
//! if let Err(e) = client.connect("127.0.0.1", 9000, "alice").await {
//!     eprintln!("connect failed with code {}", e.code());
//!     return Ok(());
//! }
//!
//! client.create_game(10).await;
//! while let Some(event) = foreground.next_event().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::receiver::{Exit, ReceiveLoop, Reader};
use crate::sender::Sender;
use crate::session::{ConnectionState, Session, SharedSession};
use crate::view::{EventSink, Foreground, TaggedEvent};
use crate::{ClientConfig, ConnectError};
use futures::StreamExt;
use lobby_core::{HostAddress, Nickname, NicknamePolicy};
use lobby_protocol::{ClientRequest, LobbyCodec, Message, parse_identity_reply};
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Live connection resources besides the writer
struct Connection {
    stop: CancellationToken,
    receiver: JoinHandle<Exit>,
}

struct Inner {
    config: ClientConfig,
    policy: Box<dyn NicknamePolicy>,
    session: SharedSession,
    sender: Sender,
    events: UnboundedSender<TaggedEvent>,
    /// Also serializes connect and disconnect
    connection: Mutex<Option<Connection>>,
}

/// Client session engine for the lobby server
///
/// # Connection Lifecycle
///
/// 1. Create the client and its [`Foreground`] with `new()`
/// 2. Connect with `connect()`
/// 3. Send requests, drain view events through the foreground
/// 4. Close with `disconnect()` or `leave_server()`
///
/// At most one connection and one receive loop exist per client. Calling
/// `connect()` while connected closes the old connection first.
#[derive(Clone)]
pub struct LobbyClient {
    inner: Arc<Inner>,
}

impl LobbyClient {
    /// Create a disconnected client and the foreground that consumes its
    /// view events.
    ///
    /// # Example
    ///
    /// ```
    /// use lobby_core::AlphanumericPolicy;
    /// use lobby_network::{ClientConfig, LobbyClient};
    ///
    /// let (client, _foreground) =
    ///     LobbyClient::new(ClientConfig::default(), AlphanumericPolicy::default());
    /// assert!(!client.is_connected());
    /// ```
    pub fn new(config: ClientConfig, policy: impl NicknamePolicy + 'static) -> (Self, Foreground) {
        debug!(?config, "Creating lobby client");

        let (tx, rx) = unbounded_channel();
        let client = Self {
            inner: Arc::new(Inner {
                sender: Sender::new(config.write_timeout),
                config,
                policy: Box::new(policy),
                session: SharedSession::new(),
                events: tx,
                connection: Mutex::new(None),
            }),
        };
        let foreground = Foreground::new(rx, client.clone());
        (client, foreground)
    }

    /// Connect to the server and identify as `nickname`.
    ///
    /// Host and nickname are trimmed and truncated to 15 and 20 characters.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::InvalidInput`] (code 2) for a blank host, a blank
    ///   nickname or one the nickname policy rejects. No socket is opened.
    /// - [`ConnectError::SocketFailure`] or [`ConnectError::ConnectTimeout`]
    ///   (code 1) if the TCP connection cannot be opened.
    /// - [`ConnectError::ProtocolFailure`] (code 3) if the handshake fails.
    ///
    /// On error the session is fully disconnected.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        nickname: &str,
    ) -> Result<(), ConnectError> {
        let (host, nickname, identify) = self.validate(host, nickname)?;

        let mut connection = self.inner.connection.lock().await;
        if connection.is_some() {
            warn!("Already connected, closing the previous connection");
            self.teardown(&mut connection).await;
        }

        self.inner.session.begin_connect(&host, port, &nickname);
        match self.open(&host, port, identify).await {
            Ok(established) => {
                *connection = Some(established);
                Ok(())
            }
            Err(e) => {
                warn!(code = e.code(), "Connect failed: {}", e);
                self.inner.sender.close().await;
                self.inner.session.reset();
                Err(e)
            }
        }
    }

    fn validate(
        &self,
        host: &str,
        nickname: &str,
    ) -> Result<(HostAddress, Nickname, Message), ConnectError> {
        let invalid = |e: lobby_core::Error| ConnectError::InvalidInput(e.to_string());

        let host = HostAddress::new(host).map_err(invalid)?;
        let requested = nickname.trim();
        let nickname = Nickname::new(requested).map_err(invalid)?;
        // Judged before truncation, so nothing hides past the 20th character.
        if !self.inner.policy.is_acceptable(requested) {
            return Err(ConnectError::InvalidInput(format!(
                "nickname '{requested}' is not allowed"
            )));
        }

        let identify = ClientRequest::Identify {
            nickname: nickname.as_str().to_string(),
        }
        .to_message("")
        .map_err(invalid)?;

        Ok((host, nickname, identify))
    }

    async fn open(
        &self,
        host: &HostAddress,
        port: u16,
        identify: Message,
    ) -> Result<Connection, ConnectError> {
        let config = &self.inner.config;
        let addr = format!("{host}:{port}");
        info!("Connecting to server at {}", addr);

        let stream =
            match tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr.as_str()))
                .await
            {
                Ok(Ok(stream)) => {
                    info!("Successfully connected to {}", addr);
                    stream
                }
                Ok(Err(e)) => {
                    error!("Connection failed: {}", e);
                    return Err(ConnectError::SocketFailure(e));
                }
                Err(_) => {
                    warn!(
                        "Connection timeout after {}ms",
                        config.connect_timeout.as_millis()
                    );
                    return Err(ConnectError::ConnectTimeout(
                        config.connect_timeout.as_millis() as u64,
                    ));
                }
            };

        // Lines are small and interactive, do not wait to coalesce them.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let codec = LobbyCodec::with_max_line_length(config.max_line_length);
        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, codec.clone());
        self.inner
            .sender
            .attach(FramedWrite::new(write_half, codec))
            .await;

        self.inner.session.set_state(ConnectionState::Handshaking);
        let id = self.handshake(&mut reader, identify).await?;

        if let Err(e) = self
            .inner
            .sender
            .send_request(&ClientRequest::Keepalive, &id)
            .await
        {
            warn!("Initial game list request not sent: {}", e);
        }
        let epoch = self.inner.session.establish(&id);
        info!(player_id = %id, epoch, "Handshake complete");

        let stop = CancellationToken::new();
        let receiver = ReceiveLoop::new(
            reader,
            self.inner.sender.clone(),
            self.inner.session.clone(),
            self.event_sink(epoch),
            stop.clone(),
            config.read_timeout,
            config.max_missed_timeouts,
        )
        .spawn();

        Ok(Connection { stop, receiver })
    }

    async fn handshake(
        &self,
        reader: &mut Reader,
        identify: Message,
    ) -> Result<String, ConnectError> {
        let read_timeout = self.inner.config.read_timeout;

        self.inner.sender.send(identify).await.map_err(|e| {
            ConnectError::ProtocolFailure(format!("identification not sent: {e}"))
        })?;

        let reply = match tokio::time::timeout(read_timeout, reader.next()).await {
            Ok(Some(Ok(reply))) => reply,
            Ok(Some(Err(e))) => {
                return Err(ConnectError::ProtocolFailure(format!(
                    "reading reply failed: {e}"
                )));
            }
            Ok(None) => {
                return Err(ConnectError::ProtocolFailure(
                    "server closed the connection before replying".to_string(),
                ));
            }
            Err(_) => {
                return Err(ConnectError::ProtocolFailure(format!(
                    "no reply within {}ms",
                    read_timeout.as_millis()
                )));
            }
        };

        debug!(%reply, "Handshake reply");
        parse_identity_reply(&reply).map_err(|e| ConnectError::ProtocolFailure(e.to_string()))
    }

    /// Close the connection and reset the session.
    ///
    /// Idempotent. Flush and shutdown errors are logged, never returned.
    pub async fn disconnect(&self) {
        let mut connection = self.inner.connection.lock().await;
        self.teardown(&mut connection).await;
    }

    /// Disconnect after the configured delay, unless the connection changed
    /// in the meantime.
    pub(crate) fn disconnect_later(&self, epoch: u64) {
        let client = self.clone();
        let delay = self.inner.config.disconnect_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            client.disconnect_epoch(epoch).await;
        });
    }

    /// Disconnect only while `epoch` is still the current connection.
    /// Returns whether a teardown ran.
    pub(crate) async fn disconnect_epoch(&self, epoch: u64) -> bool {
        let mut connection = self.inner.connection.lock().await;
        let current = self.inner.session.epoch();
        if current != epoch {
            debug!(epoch, current, "Connection changed, skipping disconnect");
            return false;
        }
        self.teardown(&mut connection).await;
        true
    }

    async fn teardown(&self, connection: &mut Option<Connection>) {
        if let Some(Connection { stop, receiver }) = connection.take() {
            let session = self.inner.session.snapshot();
            info!(
                "Closing connection to {}:{}",
                session.host_address, session.port
            );

            stop.cancel();
            self.inner.sender.close().await;
            match receiver.await {
                Ok(exit) => debug!(?exit, "Receive loop joined"),
                Err(e) => warn!("Receive loop ended abnormally: {}", e),
            }
        }
        self.inner.session.reset();
    }

    /// Send a message. Failures are logged and the message is dropped.
    pub async fn send_message(&self, message: Message) {
        if let Err(e) = self.inner.sender.send(message).await {
            warn!("Message not sent: {}", e);
        }
    }

    async fn send_request(&self, request: ClientRequest) {
        let id = self.inner.session.id();
        if let Err(e) = self.inner.sender.send_request(&request, &id).await {
            warn!(command = request.command(), "Request not sent: {}", e);
        }
    }

    /// Ask for a fresh lobby game list.
    pub async fn request_games(&self) {
        self.send_request(ClientRequest::ListGames).await;
    }

    pub async fn create_game(&self, goal: u32) {
        self.send_request(ClientRequest::CreateGame { goal }).await;
    }

    pub async fn join_game(&self, game_id: &str) {
        self.send_request(ClientRequest::JoinGame {
            game_id: game_id.to_string(),
        })
        .await;
    }

    pub async fn leave_game(&self, game_id: &str) {
        self.send_request(ClientRequest::LeaveGame {
            game_id: game_id.to_string(),
        })
        .await;
    }

    /// Record a turn choice in the active game.
    pub async fn select_choice(&self, choice: u32) {
        self.send_request(ClientRequest::SelectChoice { choice }).await;
    }

    /// Tell the server the player is leaving, then disconnect.
    pub async fn leave_server(&self) {
        self.send_request(ClientRequest::Leave).await;
        self.disconnect().await;
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.inner.session.snapshot()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.is_connected()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub(crate) fn session_handle(&self) -> &SharedSession {
        &self.inner.session
    }

    pub(crate) fn event_sink(&self, epoch: u64) -> EventSink {
        EventSink::new(self.inner.events.clone(), epoch)
    }
}

impl fmt::Debug for LobbyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LobbyClient")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session.snapshot())
            .finish_non_exhaustive()
    }
}
