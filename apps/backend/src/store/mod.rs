//! Room document stores.
//!
//! A store holds one JSON document per room code together with a version
//! counter. Writers either overwrite unconditionally or compare-and-swap on
//! the version they read. Every successful write is pushed to the room's
//! subscribers, the writer's own subscription included.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::GameSession;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind};

pub mod hub;
pub mod memory;
pub mod sea;

pub use hub::{RoomHub, RoomSubscription};
pub use memory::InMemoryRoomStore;
pub use sea::SeaRoomStore;

/// A stored room document and the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDoc {
    pub document: Value,
    pub version: i32,
}

impl VersionedDoc {
    /// Decode into a normalized session carrying the stored version.
    pub fn to_session(&self) -> Result<GameSession, DomainError> {
        let mut session = GameSession::from_document(self.document.clone())?;
        session.version = self.version;
        Ok(session)
    }
}

#[derive(Debug, Clone)]
pub enum RoomEvent {
    Updated(Arc<GameSession>),
    Deleted { room_code: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} not found")]
    NotFound(String),
    #[error("room {0} already exists")]
    AlreadyExists(String),
    #[error("room {room_code} changed underneath us: expected version {expected}, found {actual}")]
    VersionMismatch {
        room_code: String,
        expected: i32,
        actual: i32,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored document for room {room_code} is corrupt: {detail}")]
    Corrupt { room_code: String, detail: String },
    #[error(transparent)]
    Backend(DomainError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(code) => DomainError::room_not_found(&code),
            StoreError::AlreadyExists(code) => DomainError::conflict(
                ConflictKind::RoomCodeTaken,
                format!("room code {code} is already in use"),
            ),
            e @ StoreError::VersionMismatch { .. } => {
                DomainError::conflict(ConflictKind::OptimisticLock, e.to_string())
            }
            StoreError::Unavailable(detail) => {
                DomainError::infra(InfraErrorKind::StoreUnavailable, detail)
            }
            e @ StoreError::Corrupt { .. } => {
                DomainError::infra(InfraErrorKind::DataCorruption, e.to_string())
            }
            StoreError::Backend(inner) => inner,
        }
    }
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert a new room at version 1. Fails with `AlreadyExists` on a taken code.
    async fn create(&self, room_code: &str, document: Value) -> Result<VersionedDoc, StoreError>;

    async fn fetch(&self, room_code: &str) -> Result<Option<VersionedDoc>, StoreError>;

    /// Shallow-merge top-level fields into the stored document. With
    /// `expected` set the merge only lands if the version still matches.
    async fn merge(
        &self,
        room_code: &str,
        fields: Map<String, Value>,
        expected: Option<i32>,
    ) -> Result<VersionedDoc, StoreError>;

    /// Overwrite the whole document regardless of its current version.
    async fn replace(&self, room_code: &str, document: Value) -> Result<VersionedDoc, StoreError>;

    async fn replace_if_version(
        &self,
        room_code: &str,
        document: Value,
        expected: i32,
    ) -> Result<VersionedDoc, StoreError>;

    /// Returns whether a room was removed.
    async fn delete(&self, room_code: &str) -> Result<bool, StoreError>;

    fn subscribe(&self, room_code: &str) -> RoomSubscription;
}

/// Write `version` into the document so it mirrors the stored counter.
pub(crate) fn stamp_version(document: &mut Value, version: i32) {
    if let Value::Object(map) = document {
        map.insert("version".to_string(), Value::from(version));
    }
}

pub(crate) fn merge_fields(document: &mut Value, fields: Map<String, Value>) {
    if let Value::Object(map) = document {
        map.extend(fields);
    }
}

/// Build the push event for a freshly written document.
pub(crate) fn updated_event(room_code: &str, doc: &VersionedDoc) -> Option<RoomEvent> {
    match doc.to_session() {
        Ok(session) => Some(RoomEvent::Updated(Arc::new(session))),
        Err(err) => {
            tracing::warn!(room_code, error = %err, "Skipping push for undecodable document");
            None
        }
    }
}
