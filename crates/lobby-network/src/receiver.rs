//! Background receive loop, one task per connection.
//!
//! Each cycle races a bounded read against the connection's stop token:
//!
//! - a line is dispatched, then the stop token is checked;
//! - a read timeout counts as a missed beat. Below the limit the keepalive
//!   `get_games` is sent, at the limit the connection is lost;
//! - end of stream means the connection is lost;
//! - any other read error is reported as a server error;
//! - a cancelled stop token ends the loop quietly.
//!
//! The loop never tears the connection down itself. Failures become view
//! events and the foreground performs the teardown. Once the stop token is
//! set no failure is reported.

use crate::dispatcher::Dispatcher;
use crate::sender::Sender;
use crate::session::SharedSession;
use crate::view::{EventSink, ViewEvent};
use futures::{Stream, StreamExt};
use lobby_protocol::{ClientRequest, LobbyCodec, Message};
use std::time::Duration;
use tokio::net::tcp::OwnedReadHalf;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

pub(crate) type Reader = FramedRead<OwnedReadHalf, LobbyCodec>;

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    Stopped,
    ConnectionLost,
    ServerError,
}

/// Receive loop over any stream of decoded lines; connections use [`Reader`].
pub(crate) struct ReceiveLoop<R = Reader> {
    reader: R,
    sender: Sender,
    session: SharedSession,
    dispatcher: Dispatcher,
    events: EventSink,
    stop: CancellationToken,
    read_timeout: Duration,
    max_missed_timeouts: u32,
}

impl<R> ReceiveLoop<R>
where
    R: Stream<Item = lobby_core::Result<Message>> + Unpin + Send + 'static,
{
    pub(crate) fn new(
        reader: R,
        sender: Sender,
        session: SharedSession,
        events: EventSink,
        stop: CancellationToken,
        read_timeout: Duration,
        max_missed_timeouts: u32,
    ) -> Self {
        let dispatcher = Dispatcher::new(session.clone(), events.clone(), stop.clone());
        Self {
            reader,
            sender,
            session,
            dispatcher,
            events,
            stop,
            read_timeout,
            max_missed_timeouts,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<Exit> {
        tokio::spawn(self.run())
    }

    pub(crate) async fn run(mut self) -> Exit {
        debug!(
            read_timeout_ms = self.read_timeout.as_millis() as u64,
            max_missed = self.max_missed_timeouts,
            "Receive loop started"
        );

        let exit = loop {
            let read = tokio::select! {
                biased;
                _ = self.stop.cancelled() => break Exit::Stopped,
                read = tokio::time::timeout(self.read_timeout, self.reader.next()) => read,
            };

            match read {
                Ok(Some(Ok(message))) => {
                    trace!(%message, "Received message from server");
                    self.dispatcher.dispatch(&message);
                    if self.stop.is_cancelled() {
                        break Exit::Stopped;
                    }
                }
                Ok(Some(Err(e))) => {
                    error!("Failed to read from server: {}", e);
                    break self.fail(Exit::ServerError);
                }
                Ok(None) => {
                    warn!("Connection closed by server");
                    break self.fail(Exit::ConnectionLost);
                }
                Err(_) => {
                    if let Some(exit) = self.missed_beat().await {
                        break exit;
                    }
                }
            }
        };

        debug!(?exit, "Receive loop stopped");
        exit
    }

    /// Handle one read timeout. Returns the exit reason once the limit is hit.
    async fn missed_beat(&mut self) -> Option<Exit> {
        if self.stop.is_cancelled() {
            return Some(Exit::Stopped);
        }

        let missed = self.session.record_timeout();
        if missed >= self.max_missed_timeouts {
            warn!(missed, "No data from server, connection lost");
            return Some(self.fail(Exit::ConnectionLost));
        }

        info!(
            missed,
            "Receive timeout after {}ms, sending keepalive",
            self.read_timeout.as_millis()
        );
        if let Err(e) = self
            .sender
            .send_request(&ClientRequest::Keepalive, "")
            .await
        {
            warn!("Keepalive not sent: {}", e);
        }
        None
    }

    /// Report a failure unless the loop was asked to stop.
    fn fail(&self, exit: Exit) -> Exit {
        if self.stop.is_cancelled() {
            debug!(?exit, "Ignoring failure after stop");
            return Exit::Stopped;
        }

        let event = match exit {
            Exit::ServerError => ViewEvent::ServerError,
            _ => ViewEvent::ConnectionLost,
        };
        self.events.emit(event);
        exit
    }
}
