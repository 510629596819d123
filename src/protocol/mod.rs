// Protocol module: event vocabulary, frame decoding, and identifiers

pub mod error_codes;
pub mod messages;
pub mod parsing;
pub mod types;

pub use error_codes::ErrorCode;

pub use types::{
    ClientId, InterestLimits, InterestSet, DEFAULT_MAX_INTERESTS, DEFAULT_MAX_INTEREST_LENGTH,
};

pub use messages::{ClientMessage, ServerMessage};

pub use parsing::{parse_client_message, ProtocolError};
