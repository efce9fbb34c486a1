//! Client session engine for the lobby protocol
//!
//! This crate connects to a lobby server, performs the identification
//! handshake and keeps the session alive with a background receive loop.
//! Server messages are turned into [`ViewEvent`]s which the UI context
//! applies to its views through [`Foreground`].
//!
//! # Components
//!
//! - **LobbyClient**: connection manager and request API
//! - **Foreground**: consumer of view events, runs in the UI context
//! - **ViewController**: the narrow capability the UI provides
//! - **Session**: snapshot of the connection identity and liveness state
//!
//! # Example
//!
//! ```no_run
//! use lobby_core::AlphanumericPolicy;
//! use lobby_network::{ClientConfig, LobbyClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default().with_read_timeout(Duration::from_secs(15));
//! let (client, _foreground) = LobbyClient::new(config, AlphanumericPolicy::default());
//!
//! client.connect("127.0.0.1", 9000, "alice").await?;
//! assert!(client.is_connected());
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod dispatcher;
mod error;
mod receiver;
mod sender;
mod session;
pub mod view;

pub use client::LobbyClient;
pub use config::ClientConfig;
pub use error::{CONNECT_OK, ClientError, ConnectError, result_code};
pub use session::{ConnectionState, Session};
pub use view::{
    CurrentView, Foreground, GameView, LobbyView, Notice, ViewController, ViewEvent, ViewKind,
};
