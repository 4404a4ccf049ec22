//! Error codes for the card table API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes. Every code
//! is SCREAMING_SNAKE_CASE and maps 1:1 to the string in HTTP responses.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request validation
    ValidationError,
    BadRequest,
    InvalidHeader,
    /// Room code is not six Crockford base32 characters
    InvalidRoomCode,

    // Not found
    RoomNotFound,
    PlayerNotFound,
    GroupNotFound,
    NotFound,

    // Conflicts
    /// Deal or draw against an empty deck
    DeckEmpty,
    /// Version check failed after every retry
    OptimisticLock,
    RoomCodeConflict,
    Conflict,

    // Store and infrastructure
    DbError,
    StoreUnavailable,
    StoreTimeout,
    DataCorruption,
    Internal,
    ConfigError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::InvalidRoomCode => "INVALID_ROOM_CODE",
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::DeckEmpty => "DECK_EMPTY",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::RoomCodeConflict => "ROOM_CODE_CONFLICT",
            Self::Conflict => "CONFLICT",
            Self::DbError => "DB_ERROR",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::StoreTimeout => "STORE_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
