use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use serde::Deserialize;

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::utils::room_code::normalize_room_code;

/// Room code taken from the `{code}` path segment, normalized. Existence is
/// checked by the service that loads the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCode(pub String);

impl RoomCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for RoomCode {
    type Error = AppError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        std::future::ready(parse(req.match_info().get("code")))
    }
}

fn parse(raw: Option<&str>) -> Result<RoomCode, AppError> {
    let raw = raw.ok_or_else(|| {
        AppError::bad_request(ErrorCode::InvalidRoomCode, "Missing room code parameter")
    })?;
    normalize_room_code(raw).map(RoomCode).ok_or_else(|| {
        AppError::bad_request(
            ErrorCode::InvalidRoomCode,
            format!("Invalid room code: {raw}"),
        )
    })
}

/// `?viewer=` query parameter selecting whose perspective to project.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ViewerQuery {
    pub viewer: Option<String>,
}

impl ViewerQuery {
    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref().filter(|v| !v.is_empty())
    }
}
