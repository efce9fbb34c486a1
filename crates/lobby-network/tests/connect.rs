//! Integration tests for the connect handshake
//!
//! These tests run the client against a scripted server on a loopback port
//! and check the result codes and the session left behind.

mod common;

use common::{MockServer, STEP_TIMEOUT, connected, fast_config};
use lobby_core::AlphanumericPolicy;
use lobby_network::{
    ClientConfig, ConnectError, ConnectionState, LobbyClient, Session, result_code,
};
use std::time::Duration;

fn client(config: ClientConfig) -> LobbyClient {
    LobbyClient::new(config, AlphanumericPolicy::default()).0
}

fn assert_fully_disconnected(client: &LobbyClient) {
    let session = client.session();
    assert_eq!(
        session,
        Session {
            epoch: session.epoch,
            ..Session::default()
        }
    );
    assert!(!client.is_connected());
}

/// Valid input and a correct reply give code 0 and a session id
#[tokio::test]
async fn test_connect_success() {
    let server = MockServer::bind().await;
    let port = server.port();
    let peer = tokio::spawn(async move {
        let mut peer = server.accept().await;
        let identify = peer.handshake(" 1804289383 ").await;
        let keepalive = peer.read_line().await;
        (identify, keepalive)
    });

    let client = client(fast_config(1000));
    let result = client.connect("127.0.0.1", port, "alice").await;
    assert_eq!(result_code(&result), 0);

    let (identify, keepalive) = peer.await.unwrap();
    assert_eq!(identify, "1;_player_nickname;alice");
    assert_eq!(keepalive.as_deref(), Some("get_games"));

    let session = client.session();
    assert_eq!(session.id, "1804289383");
    assert_eq!(session.nickname, "alice");
    assert_eq!(session.host_address, "127.0.0.1");
    assert_eq!(session.port, port);
    assert!(session.connected);
    assert_eq!(client.state(), ConnectionState::Connected);

    client.disconnect().await;
    assert_fully_disconnected(&client);
}

/// Nickname and host are trimmed, the nickname is truncated to 20 characters
#[tokio::test]
async fn test_connect_truncates_identity() {
    let server = MockServer::bind().await;
    let port = server.port();
    let peer = tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.handshake("7").await
    });

    let client = client(fast_config(1000));
    let long_nickname = format!("  {}  ", "a".repeat(25));
    client
        .connect(" 127.0.0.1 ", port, &long_nickname)
        .await
        .unwrap();

    let expected = "a".repeat(20);
    assert_eq!(client.session().nickname, expected);
    assert_eq!(client.session().host_address, "127.0.0.1");
    assert_eq!(
        peer.await.unwrap(),
        format!("1;_player_nickname;{expected}")
    );

    client.disconnect().await;
}

/// Blank or unsanitary input gives code 2 without touching the network
#[tokio::test]
async fn test_invalid_input_opens_no_socket() {
    let server = MockServer::bind().await;
    let port = server.port();
    let client = client(fast_config(1000));

    // Reserved characters past the 20 character cut still reject the nickname.
    let hidden = format!("{}<x>", "a".repeat(20));
    for (host, nickname) in [
        ("", "alice"),
        ("127.0.0.1", ""),
        ("127.0.0.1", "al;ice"),
        ("127.0.0.1", hidden.as_str()),
    ] {
        let result = client.connect(host, port, nickname).await;
        assert_eq!(result_code(&result), 2, "host={host:?} nickname={nickname:?}");
    }

    let accepted = tokio::time::timeout(Duration::from_millis(200), server.accept()).await;
    assert!(accepted.is_err(), "no connection should have been made");
    assert_fully_disconnected(&client);
}

/// Nothing listening gives code 1
#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let server = MockServer::bind().await;
        server.port()
    };

    let client = client(fast_config(1000));
    let err = client.connect("127.0.0.1", port, "alice").await.unwrap_err();

    assert!(matches!(err, ConnectError::SocketFailure(_)));
    assert_eq!(err.code(), 1);
    assert_fully_disconnected(&client);
}

/// A wrong reply gives code 3 and the socket is released
#[tokio::test]
async fn test_bad_reply_is_protocol_failure() {
    let server = MockServer::bind().await;
    let port = server.port();
    let peer = tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.read_line().await;
        peer.send("1804289383;kick_player").await;
        // the client must close its side
        peer.read_line().await
    });

    let client = client(fast_config(1000));
    let err = client.connect("127.0.0.1", port, "alice").await.unwrap_err();

    assert!(matches!(err, ConnectError::ProtocolFailure(_)));
    assert_eq!(err.code(), 3);
    assert_fully_disconnected(&client);

    let after = tokio::time::timeout(STEP_TIMEOUT, peer).await.unwrap().unwrap();
    assert_eq!(after, None);
}

/// No reply within the read timeout gives code 3
#[tokio::test]
async fn test_silent_server_is_protocol_failure() {
    let server = MockServer::bind().await;
    let port = server.port();
    let peer = tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.read_line().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let client = client(fast_config(100));
    let err = client.connect("127.0.0.1", port, "alice").await.unwrap_err();

    assert_eq!(err.code(), 3);
    assert_fully_disconnected(&client);
    peer.abort();
}

/// The server hanging up before replying gives code 3
#[tokio::test]
async fn test_eof_before_reply_is_protocol_failure() {
    let server = MockServer::bind().await;
    let port = server.port();
    tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.read_line().await;
    });

    let client = client(fast_config(1000));
    let err = client.connect("127.0.0.1", port, "alice").await.unwrap_err();

    assert_eq!(err.code(), 3);
    assert_fully_disconnected(&client);
}

/// Connecting again replaces the previous connection
#[tokio::test]
async fn test_reconnect_replaces_connection() {
    let (client, _foreground, mut first) = connected(fast_config(5000), "1").await;
    assert_eq!(first.read_line().await.as_deref(), Some("get_games"));
    let first_epoch = client.session().epoch;

    let server = MockServer::bind().await;
    let port = server.port();
    let second = tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.handshake("2").await;
        peer
    });

    client.connect("127.0.0.1", port, "bob").await.unwrap();
    let _second = second.await.unwrap();

    // the first server sees the old connection close
    assert_eq!(first.read_line().await, None);

    let session = client.session();
    assert_eq!(session.id, "2");
    assert_eq!(session.nickname, "bob");
    assert!(session.epoch > first_epoch);

    client.disconnect().await;
}
