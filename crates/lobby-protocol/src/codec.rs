//! Line codec for the lobby wire protocol.
//!
//! This module has two layers:
//! - [`decode`] and [`encode`] convert between a raw line and its fields.
//! - [`LobbyCodec`] frames [`Message`]s on a byte stream, one per
//!   `\n`-terminated line, for use with Tokio's `Framed`, `FramedRead` and
//!   `FramedWrite`.
//!
//! # Architecture
//!
//! ```text
//! TCP Stream -> LobbyCodec::decode -> Message -> decode() -> fields
//! fields -> encode() -> Message -> LobbyCodec::encode -> TCP Stream
//! ```
//!
//! The dispatcher only sees [`Message`]s, so a different framing could
//! replace this codec without touching the command handling.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use lobby_protocol::{LobbyCodec, Message};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> lobby_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:10000").await?;
//! let mut framed = Framed::new(stream, LobbyCodec::new());
//!
//! framed.send(Message::new("1;_player_nickname;alice")).await?;
//! if let Some(Ok(reply)) = framed.next().await {
//!     println!("Received: {}", reply);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Malformed Input
//!
//! Decoding never fails on content. Invalid UTF-8 is replaced lossily. A
//! line longer than the configured maximum is discarded with a warning, and
//! decoding resumes after the next terminator. The only decode errors are
//! I/O errors from the underlying stream, so one bad line cannot end a
//! `FramedRead` stream.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::Message;
use lobby_core::{
    Error, Result,
    constants::{CARRIAGE_RETURN, DEFAULT_MAX_LINE_LENGTH, FIELD_DELIMITER, LINE_TERMINATOR},
};

/// Split a raw line into fields.
///
/// Splits strictly on `;` with no escaping. Empty fields are kept, and an
/// empty line yields a single empty field.
///
/// # Example
///
/// ```
/// use lobby_protocol::decode;
///
/// assert_eq!(decode("x;update_games;Chess;42;5"), vec!["x", "update_games", "Chess", "42", "5"]);
/// assert_eq!(decode("a;;b"), vec!["a", "", "b"]);
/// assert_eq!(decode(""), vec![""]);
/// ```
pub fn decode(raw: &str) -> Vec<&str> {
    raw.split(FIELD_DELIMITER).collect()
}

/// Join fields into a raw line.
///
/// This is the inverse of [`decode`] for fields that contain no `;`.
/// Validation is the caller's concern, see [`Message::from_fields`].
///
/// # Example
///
/// ```
/// use lobby_protocol::encode;
///
/// assert_eq!(encode(["1", "_player_nickname", "alice"]), "1;_player_nickname;alice");
/// assert_eq!(encode(["get_games"]), "get_games");
/// ```
pub fn encode<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut raw = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            raw.push(FIELD_DELIMITER);
        }
        raw.push_str(field.as_ref());
    }
    raw
}

/// Tokio codec for newline-framed lobby messages.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use tokio_util::codec::Decoder;
/// use lobby_protocol::LobbyCodec;
///
/// let mut codec = LobbyCodec::new();
/// let mut buffer = BytesMut::from(&b"42;_player_id\nx;update"[..]);
///
/// let msg = codec.decode(&mut buffer).unwrap().unwrap();
/// assert_eq!(msg.raw(), "42;_player_id");
///
/// // The second line is not complete yet.
/// assert!(codec.decode(&mut buffer).unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct LobbyCodec {
    /// Maximum accepted line length in bytes, terminator excluded.
    max_line_length: usize,

    /// Index in the buffer where the next terminator scan starts.
    next_index: usize,

    /// True while skipping the rest of an oversized line.
    discarding: bool,
}

impl LobbyCodec {
    /// Create a new codec with the default maximum line length (8 KB).
    pub fn new() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a new codec with a custom maximum line length.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Get the current maximum line length.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn line_to_message(line: &[u8]) -> Message {
        let line = line.strip_suffix(&[CARRIAGE_RETURN]).unwrap_or(line);
        Message::new(String::from_utf8_lossy(line).into_owned())
    }
}

impl Default for LobbyCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LobbyCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        loop {
            // Never scan further than one byte past the limit.
            let read_to = src.len().min(self.max_line_length.saturating_add(1));
            let terminator = src[self.next_index..read_to]
                .iter()
                .position(|b| *b == LINE_TERMINATOR)
                .map(|offset| offset + self.next_index);

            match (self.discarding, terminator) {
                (true, Some(index)) => {
                    src.advance(index + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    src.advance(read_to);
                    self.next_index = 0;
                    if src.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(index)) => {
                    self.next_index = 0;
                    let line = src.split_to(index + 1);
                    return Ok(Some(Self::line_to_message(&line[..index])));
                }
                (false, None) if src.len() > self.max_line_length => {
                    warn!(
                        max_line_length = self.max_line_length,
                        "Discarding oversized line"
                    );
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    /// Yield a final unterminated line when the stream ends.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        self.next_index = 0;
        if self.discarding || src.is_empty() {
            self.discarding = false;
            src.clear();
            return Ok(None);
        }

        let line = src.split_to(src.len());
        Ok(Some(Self::line_to_message(&line)))
    }
}

impl Encoder<Message> for LobbyCodec {
    type Error = Error;

    /// Write the message followed by `\n`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidField` if the message contains a line break
    /// - `Error::LineTooLong` if the message exceeds the maximum line length
    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        item.validate()?;

        let raw = item.raw().as_bytes();
        if raw.len() > self.max_line_length {
            return Err(Error::LineTooLong {
                size: raw.len(),
                max_size: self.max_line_length,
            });
        }

        dst.reserve(raw.len() + 1);
        dst.put_slice(raw);
        dst.put_u8(LINE_TERMINATOR);
        Ok(())
    }
}
