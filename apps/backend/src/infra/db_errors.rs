//! SeaORM -> DomainError translation.
//!
//! The SeaORM room store converts `sea_orm::DbErr` here; higher layers map
//! the resulting `DomainError` to `AppError` via `From`.

use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::trace_ctx;

/// Prefix for the structured error the rooms adapter raises on a version miss.
pub const OPTIMISTIC_LOCK_PREFIX: &str = "OPTIMISTIC_LOCK:";
pub const ROOM_NOT_FOUND_PREFIX: &str = "ROOM_NOT_FOUND:";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct LockInfo {
    pub room_code: String,
    pub expected: i32,
    pub actual: i32,
}

/// Parse the payload of an `OPTIMISTIC_LOCK:` custom error.
pub fn parse_lock_info(e: &sea_orm::DbErr) -> Option<LockInfo> {
    match e {
        sea_orm::DbErr::Custom(msg) => msg
            .strip_prefix(OPTIMISTIC_LOCK_PREFIX)
            .and_then(|json| serde_json::from_str(json).ok()),
        _ => None,
    }
}

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

fn is_unique_violation(msg: &str) -> bool {
    mentions_sqlstate(msg, "23505")
        || msg.contains("duplicate key value violates unique constraint")
        || msg.contains("UNIQUE constraint failed")
}

pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    if let Some(info) = parse_lock_info(&e) {
        warn!(
            trace_id = %trace_id,
            room_code = %info.room_code,
            expected = info.expected,
            actual = info.actual,
            "Optimistic lock conflict detected"
        );
        return DomainError::conflict(
            ConflictKind::OptimisticLock,
            format!(
                "Room {} was modified concurrently (expected version {}, actual version {})",
                info.room_code, info.expected, info.actual
            ),
        );
    }

    match &e {
        sea_orm::DbErr::RecordNotFound(_) => {
            return DomainError::not_found(NotFoundKind::Other("Record".into()), "Record not found");
        }
        sea_orm::DbErr::Custom(msg) if msg.starts_with(ROOM_NOT_FOUND_PREFIX) => {
            let code = msg.trim_start_matches(ROOM_NOT_FOUND_PREFIX);
            return DomainError::room_not_found(code);
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %error_msg, "Database unavailable");
            return DomainError::infra(InfraErrorKind::StoreUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if is_unique_violation(&error_msg) {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Unique constraint violation");
        if error_msg.contains("rooms.code") || error_msg.contains("rooms_pkey") {
            return DomainError::conflict(ConflictKind::RoomCodeTaken, "Room code already exists");
        }
        return DomainError::conflict(
            ConflictKind::Other("Unique".into()),
            "Unique constraint violation",
        );
    }

    if error_msg.contains("timeout") || error_msg.contains("pool") {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Database timeout or pool issue");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %error_msg, "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}
