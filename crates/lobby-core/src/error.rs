use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Invalid field '{0}': fields must not contain ';' or line breaks")]
    InvalidField(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Unknown command token: {0}")]
    UnknownCommand(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Line too large: {size} bytes (max: {max_size})")]
    LineTooLong { size: usize, max_size: usize },

    // Payload decoding errors
    #[error("Cannot decode color: {0}")]
    InvalidColor(String),

    #[error("Cannot decode number '{value}' for {field}")]
    InvalidNumber { field: String, value: String },

    // Identity errors
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
