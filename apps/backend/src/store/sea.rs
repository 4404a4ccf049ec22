//! Room store backed by the `rooms` table.
//!
//! Writes fan out to local subscribers through the room hub. With a
//! [`RealtimeBroker`] attached, writes are also announced over Redis so other
//! server instances can push the new document to their own subscribers.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use serde_json::{Map, Value};
use tracing::warn;

use crate::adapters::rooms_sea::{self, RoomCreate, RoomDocumentUpdate};
use crate::entities::rooms;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::infra::db_errors::{map_db_err, parse_lock_info};
use crate::store::{
    merge_fields, stamp_version, updated_event, RoomHub, RoomStore, RoomSubscription,
    StoreError, VersionedDoc,
};
use crate::ws::broker::RealtimeBroker;

pub struct SeaRoomStore {
    conn: DatabaseConnection,
    hub: Arc<RoomHub>,
    broker: Option<Arc<RealtimeBroker>>,
}

impl SeaRoomStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            hub: Arc::new(RoomHub::new()),
            broker: None,
        }
    }

    pub fn with_broker(mut self, broker: Arc<RealtimeBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn hub(&self) -> Arc<RoomHub> {
        self.hub.clone()
    }

    async fn announce_update(&self, room_code: &str, doc: &VersionedDoc) {
        if let Some(event) = updated_event(room_code, doc) {
            self.hub.publish(room_code, event);
        }
        if let Some(broker) = &self.broker {
            if let Err(err) = broker.publish_room_updated(room_code, doc.version).await {
                warn!(room_code, error = %err, "Failed to relay room update");
            }
        }
    }

    async fn write(
        &self,
        room_code: &str,
        mut document: Value,
        expected: Option<i32>,
    ) -> Result<VersionedDoc, StoreError> {
        // The next version is only known up front for checked writes.
        if let Some(expected) = expected {
            stamp_version(&mut document, expected + 1);
        }
        let mut update = RoomDocumentUpdate::overwrite(room_code, encode(&document)?);
        if let Some(expected) = expected {
            update = update.expecting(expected);
        }
        // The bump and the read-back share a transaction so the row returned
        // is this write's row, not a later writer's.
        let txn = self.conn.begin().await.map_err(|e| store_err(room_code, e))?;
        let model = rooms_sea::update_document(&txn, update)
            .await
            .map_err(|e| store_err(room_code, e))?;
        txn.commit().await.map_err(|e| store_err(room_code, e))?;

        let written = decode(model)?;
        self.announce_update(room_code, &written).await;
        Ok(written)
    }
}

fn encode(document: &Value) -> Result<String, StoreError> {
    serde_json::to_string(document).map_err(|e| StoreError::Backend(DomainError::infra(
        InfraErrorKind::DataCorruption,
        format!("room document could not be encoded: {e}"),
    )))
}

pub(crate) fn decode(model: rooms::Model) -> Result<VersionedDoc, StoreError> {
    let mut document = serde_json::from_str(&model.document).map_err(|e| StoreError::Corrupt {
        room_code: model.code.clone(),
        detail: e.to_string(),
    })?;
    // Unchecked writes store the document before the counter is known.
    stamp_version(&mut document, model.version);
    Ok(VersionedDoc {
        document,
        version: model.version,
    })
}

fn store_err(room_code: &str, e: DbErr) -> StoreError {
    if let Some(info) = parse_lock_info(&e) {
        return StoreError::VersionMismatch {
            room_code: info.room_code,
            expected: info.expected,
            actual: info.actual,
        };
    }
    match map_db_err(e) {
        DomainError::NotFound(NotFoundKind::Room, _) => StoreError::NotFound(room_code.to_string()),
        DomainError::Conflict(ConflictKind::RoomCodeTaken, _) => {
            StoreError::AlreadyExists(room_code.to_string())
        }
        DomainError::Infra(InfraErrorKind::StoreUnavailable, detail) => {
            StoreError::Unavailable(detail)
        }
        other => StoreError::Backend(other),
    }
}

#[async_trait]
impl RoomStore for SeaRoomStore {
    async fn create(&self, room_code: &str, mut document: Value) -> Result<VersionedDoc, StoreError> {
        stamp_version(&mut document, 1);
        let model = rooms_sea::create_room(&self.conn, RoomCreate::new(room_code, encode(&document)?))
            .await
            .map_err(|e| store_err(room_code, e))?;
        let created = decode(model)?;
        self.announce_update(room_code, &created).await;
        Ok(created)
    }

    async fn fetch(&self, room_code: &str) -> Result<Option<VersionedDoc>, StoreError> {
        rooms_sea::find_by_code(&self.conn, room_code)
            .await
            .map_err(|e| store_err(room_code, e))?
            .map(decode)
            .transpose()
    }

    async fn merge(
        &self,
        room_code: &str,
        fields: Map<String, Value>,
        expected: Option<i32>,
    ) -> Result<VersionedDoc, StoreError> {
        let current = self
            .fetch(room_code)
            .await?
            .ok_or_else(|| StoreError::NotFound(room_code.to_string()))?;
        if let Some(expected) = expected {
            if current.version != expected {
                return Err(StoreError::VersionMismatch {
                    room_code: room_code.to_string(),
                    expected,
                    actual: current.version,
                });
            }
        }
        let mut document = current.document;
        merge_fields(&mut document, fields);
        // Guard the read-merge-write gap with the version just read.
        self.write(room_code, document, Some(current.version)).await
    }

    async fn replace(&self, room_code: &str, document: Value) -> Result<VersionedDoc, StoreError> {
        self.write(room_code, document, None).await
    }

    async fn replace_if_version(
        &self,
        room_code: &str,
        document: Value,
        expected: i32,
    ) -> Result<VersionedDoc, StoreError> {
        self.write(room_code, document, Some(expected)).await
    }

    async fn delete(&self, room_code: &str) -> Result<bool, StoreError> {
        let removed = rooms_sea::delete_by_code(&self.conn, room_code)
            .await
            .map_err(|e| store_err(room_code, e))?;
        if removed {
            self.hub.close(room_code);
            if let Some(broker) = &self.broker {
                if let Err(err) = broker.publish_room_deleted(room_code).await {
                    warn!(room_code, error = %err, "Failed to relay room deletion");
                }
            }
        }
        Ok(removed)
    }

    fn subscribe(&self, room_code: &str) -> RoomSubscription {
        self.hub.subscribe(room_code)
    }
}
