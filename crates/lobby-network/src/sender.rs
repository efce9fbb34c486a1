//! Outbound half of a connection.
//!
//! The write half of the socket lives behind an async mutex so that the
//! foreground, the receive loop's keepalive and any other task can send
//! without interleaving lines.

use crate::ClientError;
use futures::SinkExt;
use lobby_core::constants::CLOSE_TIMEOUT_MS;
use lobby_protocol::{ClientRequest, LobbyCodec, Message};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tokio_util::codec::FramedWrite;
use tracing::{debug, error, trace, warn};

pub(crate) type Writer = FramedWrite<OwnedWriteHalf, LobbyCodec>;

/// Serialized writer shared by every task of a client
#[derive(Clone)]
pub struct Sender {
    writer: Arc<Mutex<Option<Writer>>>,
    write_timeout: Duration,
}

impl Sender {
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            writer: Arc::new(Mutex::new(None)),
            write_timeout,
        }
    }

    /// Install the write half of a new connection.
    pub(crate) async fn attach(&self, writer: Writer) {
        if self.writer.lock().await.replace(writer).is_some() {
            warn!("Replacing a writer that was never closed");
        }
    }

    /// Remove the write half without closing it.
    pub(crate) async fn detach(&self) -> Option<Writer> {
        self.writer.lock().await.take()
    }

    /// Write one message.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no connection is attached
    /// - the write does not finish within the write timeout
    /// - the message contains a line break or is too long
    /// - the socket fails
    pub async fn send(&self, message: Message) -> Result<(), ClientError> {
        trace!(command = ?message.command(), "Sending message to server");

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(ClientError::NotConnected)?;

        match tokio::time::timeout(self.write_timeout, writer.send(message)).await {
            Ok(Ok(())) => {
                trace!("Message sent successfully");
                Ok(())
            }
            Ok(Err(lobby_core::Error::Io(e))) => {
                error!("Failed to send message: {}", e);
                Err(ClientError::Io(e))
            }
            Ok(Err(e)) => {
                warn!("Refusing to send message: {}", e);
                Err(ClientError::Protocol(e))
            }
            Err(_) => {
                warn!("Send timeout after {}ms", self.write_timeout.as_millis());
                Err(ClientError::WriteTimeout(
                    self.write_timeout.as_millis() as u64
                ))
            }
        }
    }

    /// Encode a request for `player_id` and write it.
    pub async fn send_request(
        &self,
        request: &ClientRequest,
        player_id: &str,
    ) -> Result<(), ClientError> {
        let message = request.to_message(player_id)?;
        self.send(message).await
    }

    /// Flush and shut down the write half, if one is attached.
    ///
    /// Flush and shutdown have a 500ms timeout each. Errors are logged and
    /// never returned, the write half is dropped either way.
    pub async fn close(&self) {
        let Some(mut writer) = self.detach().await else {
            return;
        };

        let close_timeout = Duration::from_millis(CLOSE_TIMEOUT_MS);
        match tokio::time::timeout(close_timeout, writer.flush()).await {
            Ok(Ok(())) => debug!("Flush completed successfully"),
            Ok(Err(e)) => warn!("Error flushing during close: {}", e),
            Err(_) => warn!(
                "Flush timeout during close ({}ms)",
                close_timeout.as_millis()
            ),
        }

        let mut stream = writer.into_inner();
        match tokio::time::timeout(close_timeout, stream.shutdown()).await {
            Ok(Ok(())) => debug!("Shutdown completed successfully"),
            Ok(Err(e)) => warn!("Error during shutdown: {}", e),
            Err(_) => warn!(
                "Shutdown timeout during close ({}ms)",
                close_timeout.as_millis()
            ),
        }
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}
