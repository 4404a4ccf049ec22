//! Room store selection.

use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Rooms live in process memory and vanish on restart.
    #[default]
    Memory,
    /// Rooms live in the `rooms` table.
    Database,
}

impl StoreKind {
    /// Read `ROOM_STORE` (`memory` | `database`), defaulting to memory.
    pub fn from_env() -> Result<Self, AppError> {
        match env::var("ROOM_STORE") {
            Err(_) => Ok(Self::default()),
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "memory" => Ok(Self::Memory),
                "database" | "db" => Ok(Self::Database),
                other => Err(AppError::config(format!(
                    "ROOM_STORE must be 'memory' or 'database', got '{other}'"
                ))),
            },
        }
    }
}

/// Optional Redis endpoint for relaying room writes between instances.
pub fn redis_url() -> Option<String> {
    env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty())
}
