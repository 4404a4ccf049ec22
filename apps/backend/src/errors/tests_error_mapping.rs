// Domain and store errors mapped onto HTTP-facing AppError codes.
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::store::StoreError;
use crate::{AppError, ErrorCode};

#[test]
fn maps_validation_to_400() {
    let app: AppError = DomainError::validation("bad field").into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
    assert_eq!(app.status().as_u16(), 400);
}

#[test]
fn maps_conflicts() {
    let app: AppError = DomainError::conflict(ConflictKind::OptimisticLock, "stale").into();
    assert_eq!(app.code(), ErrorCode::OptimisticLock);
    assert_eq!(app.status().as_u16(), 409);

    let app: AppError = DomainError::conflict(ConflictKind::RoomCodeTaken, "taken").into();
    assert_eq!(app.code(), ErrorCode::RoomCodeConflict);

    let app: AppError = DomainError::conflict(ConflictKind::Other("x".into()), "other").into();
    assert_eq!(app.code(), ErrorCode::Conflict);
}

#[test]
fn maps_not_found_kinds() {
    let app: AppError = DomainError::room_not_found("ABC123").into();
    assert_eq!(app.code(), ErrorCode::RoomNotFound);
    assert_eq!(app.status().as_u16(), 404);

    let app: AppError = DomainError::not_found(NotFoundKind::Player, "p").into();
    assert_eq!(app.code(), ErrorCode::PlayerNotFound);

    let app: AppError = DomainError::not_found(NotFoundKind::Group, "g").into();
    assert_eq!(app.code(), ErrorCode::GroupNotFound);
}

#[test]
fn empty_deck_is_a_conflict() {
    let app: AppError = DomainError::exhausted("deck is empty").into();
    assert_eq!(app.code(), ErrorCode::DeckEmpty);
    assert_eq!(app.status().as_u16(), 409);
}

#[test]
fn maps_infra() {
    let app: AppError = DomainError::infra(InfraErrorKind::Timeout, "slow").into();
    assert!(matches!(app, AppError::Timeout { .. }));
    assert_eq!(app.status().as_u16(), 504);

    let app: AppError = DomainError::infra(InfraErrorKind::StoreUnavailable, "down").into();
    assert_eq!(app.code(), ErrorCode::StoreUnavailable);
    assert_eq!(app.status().as_u16(), 503);

    let app: AppError = DomainError::infra(InfraErrorKind::DataCorruption, "bad").into();
    assert_eq!(app.code(), ErrorCode::DataCorruption);
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn maps_store_errors() {
    let app: AppError = StoreError::NotFound("ABC123".into()).into();
    assert_eq!(app.code(), ErrorCode::RoomNotFound);

    let app: AppError = StoreError::VersionMismatch {
        room_code: "ABC123".into(),
        expected: 3,
        actual: 4,
    }
    .into();
    assert_eq!(app.code(), ErrorCode::OptimisticLock);

    let app: AppError = StoreError::AlreadyExists("ABC123".into()).into();
    assert_eq!(app.code(), ErrorCode::RoomCodeConflict);

    let app: AppError = StoreError::Unavailable("redis".into()).into();
    assert_eq!(app.status().as_u16(), 503);
}
