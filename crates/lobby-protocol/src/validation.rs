//! Field validation for the lobby wire format.
//!
//! The protocol has no escaping, so a field containing `;` would split into
//! two fields on the server, and a line break would end the message early.
//! Every outgoing field goes through [`validate_field`] before it is joined.
//!
//! # Examples
//!
//! ```
//! use lobby_protocol::validate_field;
//!
//! assert!(validate_field("alice").is_ok());
//! assert!(validate_field("").is_ok());
//!
//! assert!(validate_field("a;b").is_err());
//! assert!(validate_field("a\nb").is_err());
//! ```

use lobby_core::{Error, Result, sanitize::contains_reserved};

/// Validate a single field for protocol safety.
///
/// Empty fields are valid, they are preserved by the codec.
///
/// # Errors
///
/// Returns `Error::InvalidField` if the field contains `;`, `\n` or `\r`.
pub fn validate_field(field: &str) -> Result<()> {
    if contains_reserved(field) {
        return Err(Error::InvalidField(field.to_string()));
    }
    Ok(())
}

/// Validate that a raw line can be written as exactly one message.
///
/// # Errors
///
/// Returns `Error::InvalidField` if the line contains a line break.
pub fn validate_line(raw: &str) -> Result<()> {
    if raw.contains(['\n', '\r']) {
        return Err(Error::InvalidField(raw.to_string()));
    }
    Ok(())
}
