pub mod constants;
pub mod error;
pub mod sanitize;
pub mod types;

pub use error::{Error, Result};
pub use sanitize::{AlphanumericPolicy, NicknamePolicy};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
