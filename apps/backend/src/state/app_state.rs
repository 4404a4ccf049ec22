use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::rooms::RoomsConfig;
use crate::config::sync::SyncConfig;
use crate::services::{RoomService, SyncService, TableService};
use crate::store::RoomStore;
use crate::ws::broker::RealtimeBroker;

/// Shared handles for request handlers and websocket sessions.
#[derive(Clone)]
pub struct AppState {
    /// Database connection, present when rooms live in SQL.
    pub db: Option<DatabaseConnection>,
    pub store: Arc<dyn RoomStore>,
    pub sync: SyncService,
    pub rooms: RoomService,
    pub table: TableService,
    /// Cross-instance relay, present when `REDIS_URL` is set.
    pub broker: Option<Arc<RealtimeBroker>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RoomStore>,
        sync_config: SyncConfig,
        rooms_config: RoomsConfig,
    ) -> Self {
        let sync = SyncService::new(store.clone(), sync_config);
        Self {
            db: None,
            store,
            rooms: RoomService::new(sync.clone(), rooms_config),
            table: TableService::new(sync.clone()),
            sync,
            broker: None,
        }
    }

    pub fn with_db(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_broker(mut self, broker: Arc<RealtimeBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}
