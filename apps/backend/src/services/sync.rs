//! Read-apply-write cycle over the room store.
//!
//! Every mutation loads the room, normalizes it, runs a pure transform on a
//! copy, stamps `lastUpdate` and writes the whole document back. In
//! versioned mode the write only lands if nobody else wrote in between;
//! otherwise the cycle starts over, up to `max_attempts` times.

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::sync::{SyncConfig, WriteMode};
use crate::domain::session::now_millis;
use crate::domain::GameSession;
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::errors::ErrorCode;
use crate::store::{RoomStore, RoomSubscription, StoreError, VersionedDoc};

/// Result of a committed cycle: the stored session and what the transform returned.
#[derive(Debug, Clone)]
pub struct Synced<T> {
    pub session: GameSession,
    pub outcome: T,
}

#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn RoomStore>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(store: Arc<dyn RoomStore>, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one store round trip under the configured timeout.
    async fn bounded<T, F>(&self, op: &str, room_code: &str, fut: F) -> Result<Result<T, StoreError>, AppError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        timeout(self.config.op_timeout, fut).await.map_err(|_| {
            warn!(room_code, op, timeout_ms = self.config.op_timeout.as_millis() as u64, "Store operation timed out");
            AppError::timeout(format!(
                "{op} for room {room_code} did not finish within {}ms",
                self.config.op_timeout.as_millis()
            ))
        })
    }

    pub async fn load(&self, room_code: &str) -> Result<GameSession, AppError> {
        let doc = self
            .bounded("fetch", room_code, self.store.fetch(room_code))
            .await??
            .ok_or_else(|| AppError::from(DomainError::room_not_found(room_code)))?;
        Ok(doc.to_session()?)
    }

    pub async fn exists(&self, room_code: &str) -> Result<bool, AppError> {
        Ok(self
            .bounded("fetch", room_code, self.store.fetch(room_code))
            .await??
            .is_some())
    }

    /// Store a brand-new room. A taken code comes back as `StoreError::AlreadyExists`.
    pub async fn create(&self, session: &GameSession) -> Result<Result<GameSession, StoreError>, AppError> {
        let mut fresh = session.clone().normalized();
        fresh.last_update = now_millis();
        let document = fresh.to_document()?;
        let created = self
            .bounded("create", &session.room_id, self.store.create(&session.room_id, document))
            .await?;
        match created {
            Ok(doc) => Ok(Ok(doc.to_session()?)),
            Err(e) => Ok(Err(e)),
        }
    }

    /// Run `transform` through the read-apply-write cycle.
    ///
    /// A transform error aborts the cycle without writing. A transform that
    /// changes nothing still writes and bumps `lastUpdate`.
    pub async fn update_room<T, F>(&self, room_code: &str, mut transform: F) -> Result<Synced<T>, AppError>
    where
        F: FnMut(&mut GameSession) -> Result<T, DomainError>,
    {
        for attempt in 1..=self.config.max_attempts {
            let current = self.load(room_code).await?;
            let expected = current.version;

            let mut next = current;
            let outcome = transform(&mut next)?;
            next.last_update = now_millis();
            next.normalize();
            let document = next.to_document()?;

            let written = match self.config.write_mode {
                WriteMode::LastWriteWins => {
                    self.bounded("replace", room_code, self.store.replace(room_code, document))
                        .await?
                }
                WriteMode::Versioned => {
                    self.bounded(
                        "replace_if_version",
                        room_code,
                        self.store.replace_if_version(room_code, document, expected),
                    )
                    .await?
                }
            };

            match written {
                Ok(doc) => return committed(room_code, attempt, doc, outcome),
                Err(StoreError::VersionMismatch { actual, .. }) => {
                    debug!(room_code, attempt, expected, actual, "Room changed during cycle, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(self.exhausted(room_code))
    }

    /// Version-checked partial write: `build` returns the top-level fields to
    /// merge into the stored document (`lastUpdate` is added).
    pub async fn patch_room<T, F>(&self, room_code: &str, mut build: F) -> Result<Synced<T>, AppError>
    where
        F: FnMut(&GameSession) -> Result<(Map<String, Value>, T), DomainError>,
    {
        for attempt in 1..=self.config.max_attempts {
            let current = self.load(room_code).await?;
            let expected = current.version;

            let (mut fields, outcome) = build(&current)?;
            fields.insert("lastUpdate".to_string(), Value::from(now_millis()));

            let guard = match self.config.write_mode {
                WriteMode::Versioned => Some(expected),
                WriteMode::LastWriteWins => None,
            };
            let written = self
                .bounded("merge", room_code, self.store.merge(room_code, fields, guard))
                .await?;

            match written {
                Ok(doc) => return committed(room_code, attempt, doc, outcome),
                Err(StoreError::VersionMismatch { actual, .. }) => {
                    debug!(room_code, attempt, expected, actual, "Room changed during patch, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(self.exhausted(room_code))
    }

    pub async fn delete_room(&self, room_code: &str) -> Result<bool, AppError> {
        Ok(self
            .bounded("delete", room_code, self.store.delete(room_code))
            .await??)
    }

    pub fn subscribe(&self, room_code: &str) -> RoomSubscription {
        self.store.subscribe(room_code)
    }

    fn exhausted(&self, room_code: &str) -> AppError {
        warn!(room_code, attempts = self.config.max_attempts, "Giving up after repeated version conflicts");
        AppError::conflict(
            ErrorCode::OptimisticLock,
            format!(
                "Room {room_code} kept changing; gave up after {} attempts",
                self.config.max_attempts
            ),
        )
    }
}

fn committed<T>(room_code: &str, attempt: u32, doc: VersionedDoc, outcome: T) -> Result<Synced<T>, AppError> {
    let session = doc.to_session()?;
    debug!(room_code, attempt, version = session.version, "Room write committed");
    Ok(Synced { session, outcome })
}
