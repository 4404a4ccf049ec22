//! Read-apply-write cycle settings.

use std::env;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Compare-and-swap on the version read at the start of the cycle.
    #[default]
    Versioned,
    /// Unconditional overwrite; concurrent cycles may lose updates.
    LastWriteWins,
}

impl WriteMode {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "versioned" => Ok(Self::Versioned),
            "last_write_wins" | "lww" => Ok(Self::LastWriteWins),
            other => Err(AppError::config(format!(
                "SYNC_WRITE_MODE must be 'versioned' or 'last_write_wins', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Upper bound for each store round trip.
    pub op_timeout: Duration,
    /// Cycles attempted before a version conflict is reported.
    pub max_attempts: u32,
    pub write_mode: WriteMode,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            op_timeout: DEFAULT_OP_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            write_mode: WriteMode::Versioned,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("SYNC_OP_TIMEOUT_MS") {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                AppError::config(format!("SYNC_OP_TIMEOUT_MS must be an integer, got '{raw}'"))
            })?;
            config.op_timeout = Duration::from_millis(ms);
        }
        if let Ok(raw) = env::var("SYNC_MAX_ATTEMPTS") {
            let attempts: u32 = raw.trim().parse().map_err(|_| {
                AppError::config(format!("SYNC_MAX_ATTEMPTS must be an integer, got '{raw}'"))
            })?;
            if attempts == 0 {
                return Err(AppError::config("SYNC_MAX_ATTEMPTS must be at least 1"));
            }
            config.max_attempts = attempts;
        }
        if let Ok(raw) = env::var("SYNC_WRITE_MODE") {
            config.write_mode = WriteMode::parse(&raw)?;
        }
        Ok(config)
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }
}
