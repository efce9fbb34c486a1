use crate::codec;
use crate::validation::{validate_field, validate_line};
use lobby_core::{Error, Result, constants::COMMAND_INDEX};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One protocol line, without its terminator.
///
/// Semantically a sequence of `;`-separated fields. Field 1 is the command
/// token. A message is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    raw: String,
}

impl Message {
    /// Wrap a raw line as received from the wire.
    ///
    /// No validation is performed: inbound lines are accepted as-is and the
    /// dispatcher decides whether they make sense.
    pub fn new(raw: impl Into<String>) -> Self {
        Message { raw: raw.into() }
    }

    /// Build a message from individual fields.
    ///
    /// # Errors
    /// Returns `Error::InvalidField` if any field contains `;` or a line break.
    ///
    /// # Example
    /// ```
    /// use lobby_protocol::Message;
    ///
    /// let msg = Message::from_fields(["1", "_player_nickname", "alice"]).unwrap();
    /// assert_eq!(msg.raw(), "1;_player_nickname;alice");
    /// assert_eq!(msg.command(), Some("_player_nickname"));
    ///
    /// assert!(Message::from_fields(["1", "bad;field"]).is_err());
    /// ```
    pub fn from_fields<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<S> = fields.into_iter().collect();
        for field in &fields {
            validate_field(field.as_ref())?;
        }
        Ok(Message::new(codec::encode(&fields)))
    }

    /// Check that the message can be written as exactly one line.
    ///
    /// # Errors
    /// Returns `Error::InvalidField` if the raw text contains a line break.
    pub fn validate(&self) -> Result<()> {
        validate_line(&self.raw)
    }

    /// The raw line.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All fields in order. An empty message has one empty field.
    pub fn fields(&self) -> Vec<&str> {
        codec::decode(&self.raw)
    }

    /// Get field by index
    pub fn field(&self, index: usize) -> Option<&str> {
        self.raw.split(lobby_core::constants::FIELD_DELIMITER).nth(index)
    }

    /// Get required field or error
    pub fn required_field(&self, index: usize, name: &str) -> Result<&str> {
        self.field(index)
            .ok_or_else(|| Error::MissingField(name.to_string()))
    }

    /// The command token, if the message has one.
    pub fn command(&self) -> Option<&str> {
        self.field(COMMAND_INDEX)
    }

    /// Number of fields in the message
    pub fn field_count(&self) -> usize {
        self.raw.split(lobby_core::constants::FIELD_DELIMITER).count()
    }

    pub fn into_raw(self) -> String {
        self.raw
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
