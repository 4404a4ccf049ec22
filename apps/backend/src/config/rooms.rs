//! Room lifecycle settings.

use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomsConfig {
    /// Put a shuffled 52-card deck on the table when a room is created.
    pub seed_deck_on_create: bool,
    /// Attempts at finding an unused room code.
    pub code_attempts: u32,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            seed_deck_on_create: true,
            code_attempts: 8,
        }
    }
}

impl RoomsConfig {
    /// Read `ROOMS_SEED_DECK` (`true`/`false`, default true).
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("ROOMS_SEED_DECK") {
            config.seed_deck_on_create = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(AppError::config(format!(
                        "ROOMS_SEED_DECK must be true or false, got '{other}'"
                    )))
                }
            };
        }
        Ok(config)
    }

    pub fn without_seed_deck(mut self) -> Self {
        self.seed_deck_on_create = false;
        self
    }
}
