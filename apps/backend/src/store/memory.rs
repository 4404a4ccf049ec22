//! Process-local room store.
//!
//! Backs tests and single-instance deployments. Each room's entry lock is the
//! serialization point for compare-and-swap writes.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::store::{
    merge_fields, stamp_version, updated_event, RoomHub, RoomStore, RoomSubscription,
    StoreError, VersionedDoc,
};

#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: DashMap<String, VersionedDoc>,
    hub: Arc<RoomHub>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn notify(&self, room_code: &str, doc: &VersionedDoc) {
        if let Some(event) = updated_event(room_code, doc) {
            self.hub.publish(room_code, event);
        }
    }

    /// Apply `write` to the stored document under the entry lock.
    fn write_with<F>(
        &self,
        room_code: &str,
        expected: Option<i32>,
        write: F,
    ) -> Result<VersionedDoc, StoreError>
    where
        F: FnOnce(&mut Value),
    {
        let written = {
            let mut entry = self
                .rooms
                .get_mut(room_code)
                .ok_or_else(|| StoreError::NotFound(room_code.to_string()))?;
            if let Some(expected) = expected {
                if entry.version != expected {
                    return Err(StoreError::VersionMismatch {
                        room_code: room_code.to_string(),
                        expected,
                        actual: entry.version,
                    });
                }
            }
            write(&mut entry.document);
            entry.version += 1;
            let version = entry.version;
            stamp_version(&mut entry.document, version);
            entry.clone()
        };
        self.notify(room_code, &written);
        Ok(written)
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn create(&self, room_code: &str, mut document: Value) -> Result<VersionedDoc, StoreError> {
        let created = match self.rooms.entry(room_code.to_string()) {
            Entry::Occupied(_) => return Err(StoreError::AlreadyExists(room_code.to_string())),
            Entry::Vacant(slot) => {
                stamp_version(&mut document, 1);
                slot.insert(VersionedDoc {
                    document,
                    version: 1,
                })
                .clone()
            }
        };
        self.notify(room_code, &created);
        Ok(created)
    }

    async fn fetch(&self, room_code: &str) -> Result<Option<VersionedDoc>, StoreError> {
        Ok(self.rooms.get(room_code).map(|doc| doc.clone()))
    }

    async fn merge(
        &self,
        room_code: &str,
        fields: Map<String, Value>,
        expected: Option<i32>,
    ) -> Result<VersionedDoc, StoreError> {
        self.write_with(room_code, expected, |doc| merge_fields(doc, fields))
    }

    async fn replace(&self, room_code: &str, document: Value) -> Result<VersionedDoc, StoreError> {
        self.write_with(room_code, None, |doc| *doc = document)
    }

    async fn replace_if_version(
        &self,
        room_code: &str,
        document: Value,
        expected: i32,
    ) -> Result<VersionedDoc, StoreError> {
        self.write_with(room_code, Some(expected), |doc| *doc = document)
    }

    async fn delete(&self, room_code: &str) -> Result<bool, StoreError> {
        let removed = self.rooms.remove(room_code).is_some();
        if removed {
            self.hub.close(room_code);
        }
        Ok(removed)
    }

    fn subscribe(&self, room_code: &str) -> RoomSubscription {
        self.hub.subscribe(room_code)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::RoomEvent;

    fn doc(room: &str) -> Value {
        json!({"roomId": room, "players": [], "deckCards": [], "lastUpdate": 0})
    }

    #[tokio::test]
    async fn create_rejects_taken_codes() {
        let store = InMemoryRoomStore::new();
        let created = store.create("ABC123", doc("ABC123")).await.unwrap();
        assert_eq!(created.version, 1);
        assert_eq!(created.document["version"], 1);

        let err = store.create("ABC123", doc("ABC123")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn replace_if_version_detects_stale_writers() {
        let store = InMemoryRoomStore::new();
        store.create("ABC123", doc("ABC123")).await.unwrap();

        let written = store
            .replace_if_version("ABC123", doc("ABC123"), 1)
            .await
            .unwrap();
        assert_eq!(written.version, 2);

        let err = store
            .replace_if_version("ABC123", doc("ABC123"), 1)
            .await
            .unwrap_err();
        match err {
            StoreError::VersionMismatch {
                expected, actual, ..
            } => assert_eq!((expected, actual), (1, 2)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn writes_to_missing_rooms_fail() {
        let store = InMemoryRoomStore::new();
        assert!(matches!(
            store.replace("NOPE00", doc("NOPE00")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.delete("NOPE00").await.unwrap());
        assert!(store.fetch("NOPE00").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_keeps_untouched_fields() {
        let store = InMemoryRoomStore::new();
        store
            .create("ABC123", json!({"roomId": "ABC123", "deckCards": [], "players": []}))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("lastUpdate".into(), json!(42));
        let merged = store.merge("ABC123", fields, Some(1)).await.unwrap();

        assert_eq!(merged.version, 2);
        assert_eq!(merged.document["lastUpdate"], 42);
        assert_eq!(merged.document["roomId"], "ABC123");
    }

    #[tokio::test]
    async fn writer_sees_its_own_write_and_delete() {
        let store = InMemoryRoomStore::new();
        store.create("ABC123", doc("ABC123")).await.unwrap();
        let mut sub = store.subscribe("ABC123");

        store.replace("ABC123", doc("ABC123")).await.unwrap();
        match sub.recv().await {
            Some(RoomEvent::Updated(session)) => assert_eq!(session.version, 2),
            other => panic!("unexpected event: {other:?}"),
        }

        assert!(store.delete("ABC123").await.unwrap());
        assert!(matches!(sub.recv().await, Some(RoomEvent::Deleted { .. })));
        assert!(sub.recv().await.is_none());
        assert_eq!(store.hub.subscriber_count("ABC123"), 0);
    }
}
