pub mod codec;
pub mod message;
pub mod request;
pub mod server;
pub mod validation;

pub use codec::{LobbyCodec, decode, encode};
pub use message::Message;
pub use request::ClientRequest;
pub use server::{ServerMessage, parse_identity_reply};
pub use validation::validate_field;
