//! Integration tests for the receive loop, the dispatcher and the foreground
//!
//! A scripted server drives a connected client. Read timeouts are shortened
//! to a few hundred milliseconds so liveness paths run in real time.

mod common;

use common::{RecordingView, STEP_TIMEOUT, connected, fast_config};
use lobby_core::{Color, Game, Player};
use lobby_network::{ConnectionState, Foreground, LobbyClient, Notice, ViewEvent, ViewKind};
use std::time::Duration;

async fn next_event(foreground: &mut Foreground) -> ViewEvent {
    tokio::time::timeout(STEP_TIMEOUT, foreground.next_event())
        .await
        .expect("no view event")
        .expect("event queue closed")
}

async fn wait_disconnected(client: &LobbyClient) {
    tokio::time::timeout(STEP_TIMEOUT, async {
        while client.is_connected() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never disconnected");
}

/// Two read timeouts in a row lose the connection exactly once
#[tokio::test]
async fn test_two_timeouts_lose_connection() {
    let (client, mut foreground, mut peer) = connected(fast_config(100), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));

    // one keepalive after the first timeout
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));

    let event = next_event(&mut foreground).await;
    assert_eq!(event, ViewEvent::ConnectionLost);

    let mut view = RecordingView::new(ViewKind::Lobby);
    foreground.apply(&mut view, event).await;

    assert_eq!(view.loaded, vec![ViewKind::ConnectionForm]);
    assert_eq!(view.notices, vec![Notice::LostConnection]);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.session().id.is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(foreground.try_next_event(), None);
    assert_eq!(peer.read_line().await, None);
}

/// A lobby update between timeouts keeps the connection alive
#[tokio::test]
async fn test_update_games_resets_liveness() {
    let (client, mut foreground, mut peer) = connected(fast_config(300), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));

    // first timeout, keepalive
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));
    peer.send("x;update_games;Chess;42;5").await;

    let event = next_event(&mut foreground).await;
    assert_eq!(
        event,
        ViewEvent::GamesUpdated(vec![Game::new("42", "Chess", 5)])
    );
    assert_eq!(client.session().timeout_count, 0);

    // the counter restarted, so the next timeout sends another keepalive
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));
    assert!(client.is_connected());

    let mut view = RecordingView::new(ViewKind::Lobby);
    foreground.apply(&mut view, event).await;
    assert_eq!(
        view.screens.game_lists,
        vec![vec![Game::new("42", "Chess", 5)]]
    );
    assert!(view.notices.is_empty());

    client.disconnect().await;
}

/// `disconnect_player` stops reading and returns to the connection form
#[tokio::test]
async fn test_disconnect_player() {
    let (client, mut foreground, mut peer) = connected(fast_config(5000), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));

    peer.send("x;disconnect_player").await;
    let event = next_event(&mut foreground).await;
    assert_eq!(event, ViewEvent::ServerDisconnected);

    // the connection stays up until the delayed teardown
    let mut view = RecordingView::new(ViewKind::Game);
    foreground.apply(&mut view, event).await;
    assert_eq!(view.current, Some(ViewKind::ConnectionForm));
    assert!(view.notices.is_empty());

    wait_disconnected(&client).await;
    assert_eq!(peer.read_line().await, None);
    assert_eq!(foreground.try_next_event(), None);
}

/// The delayed teardown never closes a newer connection
#[tokio::test]
async fn test_delayed_disconnect_spares_new_connection() {
    let config = fast_config(5000).with_disconnect_delay(Duration::from_millis(300));
    let (client, mut foreground, mut peer) = connected(config, "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));

    peer.send("x;disconnect_player").await;
    let event = next_event(&mut foreground).await;
    let mut view = RecordingView::new(ViewKind::Lobby);
    foreground.apply(&mut view, event).await;

    // reconnect before the delay runs out
    let server = common::MockServer::bind().await;
    let port = server.port();
    let second = tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.handshake("43").await;
        peer
    });
    client.connect("127.0.0.1", port, "alice").await.unwrap();
    let _second = second.await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(client.is_connected());
    assert_eq!(client.session().id, "43");

    client.disconnect().await;
}

/// A failure taken from the queue before a reconnect leaves the new connection alone
#[tokio::test]
async fn test_stale_failure_spares_new_connection() {
    let (client, mut foreground, mut peer) = connected(fast_config(5000), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));

    drop(peer);
    let event = next_event(&mut foreground).await;
    assert_eq!(event, ViewEvent::ConnectionLost);

    let server = common::MockServer::bind().await;
    let port = server.port();
    let second = tokio::spawn(async move {
        let mut peer = server.accept().await;
        peer.handshake("43").await;
        peer
    });
    client.connect("127.0.0.1", port, "alice").await.unwrap();
    let _second = second.await.unwrap();

    let mut view = RecordingView::new(ViewKind::Lobby);
    foreground.apply(&mut view, event).await;

    assert!(view.loaded.is_empty());
    assert!(view.notices.is_empty());
    assert!(client.is_connected());
    assert_eq!(client.session().id, "43");

    client.disconnect().await;
}

/// Malformed lines are dropped and reading continues
#[tokio::test]
async fn test_malformed_lines_are_survived() {
    let (client, mut foreground, mut peer) = connected(fast_config(5000), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));
    let before = client.session();

    peer.send("garbage").await;
    peer.send("").await;
    peer.send("x;update_players;1;alice;not-a-color").await;
    peer.send("x;prepare_window_for_game;7").await;
    peer.send("x;update_games;Go;43;10").await;

    assert_eq!(
        next_event(&mut foreground).await,
        ViewEvent::GamesUpdated(vec![Game::new("43", "Go", 10)])
    );
    assert_eq!(client.session(), before);
    assert!(client.is_connected());

    client.disconnect().await;
}

/// Events still queued when the connection closes are never applied
#[tokio::test]
async fn test_stale_events_dropped_after_disconnect() {
    let (client, mut foreground, mut peer) = connected(fast_config(5000), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));

    peer.send("x;update_games;Chess;42;5").await;
    peer.send("x;update_players;1;alice;#00ff00").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    client.disconnect().await;

    let mut view = RecordingView::new(ViewKind::Lobby);
    assert_eq!(foreground.drain(&mut view).await, 0);
    assert!(view.screens.game_lists.is_empty());
}

/// The server closing the stream is a lost connection
#[tokio::test]
async fn test_server_eof_is_connection_lost() {
    let (client, mut foreground, mut peer) = connected(fast_config(5000), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));
    drop(peer);

    let event = next_event(&mut foreground).await;
    assert_eq!(event, ViewEvent::ConnectionLost);

    let mut view = RecordingView::new(ViewKind::Game);
    foreground.apply(&mut view, event).await;
    assert_eq!(view.notices, vec![Notice::LostConnection]);
    assert!(!client.is_connected());
}

/// Game flow: enter a game, receive players, send requests with the session id
#[tokio::test]
async fn test_game_flow() {
    let (client, mut foreground, mut peer) = connected(fast_config(5000), "42").await;
    assert_eq!(peer.read_line().await.as_deref(), Some("get_games"));
    let mut view = RecordingView::new(ViewKind::Lobby);

    client.create_game(10).await;
    assert_eq!(
        peer.read_line().await.as_deref(),
        Some("42;create_new_game;10")
    );

    peer.send("x;prepare_window_for_game;7;Duel;10").await;
    let event = next_event(&mut foreground).await;
    foreground.apply(&mut view, event).await;
    assert_eq!(view.current, Some(ViewKind::Game));
    assert_eq!(view.screens.game, Some(Game::new("7", "Duel", 10)));
    assert_eq!(client.session().game_id, "7");

    peer.send("x;update_players;42;alice;#ff0000;43;bob;blue").await;
    let event = next_event(&mut foreground).await;
    foreground.apply(&mut view, event).await;
    assert_eq!(
        view.screens.player_lists,
        vec![vec![
            Player::new("42", "alice", Color::rgb(255, 0, 0)),
            Player::new("43", "bob", Color::rgb(0, 0, 255)),
        ]]
    );

    client.select_choice(2).await;
    client.leave_game("7").await;
    assert_eq!(
        peer.read_line().await.as_deref(),
        Some("42;game_choice_selected;2")
    );
    assert_eq!(
        peer.read_line().await.as_deref(),
        Some("42;disconnect_player_from_game;7")
    );

    client.leave_server().await;
    assert_eq!(
        peer.read_line().await.as_deref(),
        Some("42;disconnect_player")
    );
    assert_eq!(peer.read_line().await, None);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
