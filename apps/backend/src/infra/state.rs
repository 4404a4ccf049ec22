use std::sync::Arc;

use tracing::info;

use crate::config::db::{DbOwner, DbProfile};
use crate::config::rooms::RoomsConfig;
use crate::config::sync::SyncConfig;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;
use crate::store::{InMemoryRoomStore, RoomStore, SeaRoomStore};
use crate::ws::broker::RealtimeBroker;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    db_profile: Option<DbProfile>,
    store: Option<Arc<dyn RoomStore>>,
    sync_config: SyncConfig,
    rooms_config: RoomsConfig,
    redis_url: Option<String>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            db_profile: None,
            store: None,
            sync_config: SyncConfig::default(),
            rooms_config: RoomsConfig::default(),
            redis_url: None,
        }
    }

    /// Keep rooms in SQL under `profile` (migrations run on build).
    pub fn with_db(mut self, profile: DbProfile) -> Self {
        self.db_profile = Some(profile);
        self
    }

    /// Use a caller-supplied store; wins over `with_db`.
    pub fn with_store(mut self, store: Arc<dyn RoomStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sync_config(mut self, config: SyncConfig) -> Self {
        self.sync_config = config;
        self
    }

    pub fn with_rooms_config(mut self, config: RoomsConfig) -> Self {
        self.rooms_config = config;
        self
    }

    pub fn with_redis(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        if let Some(store) = self.store {
            return Ok(AppState::new(store, self.sync_config, self.rooms_config));
        }

        let Some(profile) = self.db_profile else {
            if self.redis_url.is_some() {
                return Err(AppError::config(
                    "REDIS_URL needs the database room store (ROOM_STORE=database)",
                ));
            }
            info!(store = "memory", "Room store ready");
            let store: Arc<dyn RoomStore> = Arc::new(InMemoryRoomStore::new());
            return Ok(AppState::new(store, self.sync_config, self.rooms_config));
        };

        // single entrypoint: build + migrate
        let conn = bootstrap_db(profile, DbOwner::App).await?;
        let mut store = SeaRoomStore::new(conn.clone());
        let mut broker = None;
        if let Some(url) = self.redis_url.as_deref() {
            let relay = RealtimeBroker::connect(url, conn.clone(), store.hub()).await?;
            info!(instance_id = %relay.instance_id(), "Realtime relay connected");
            store = store.with_broker(relay.clone());
            broker = Some(relay);
        }
        info!(store = "database", profile = ?profile, "Room store ready");

        let store: Arc<dyn RoomStore> = Arc::new(store);
        let mut state = AppState::new(store, self.sync_config, self.rooms_config).with_db(conn);
        if let Some(relay) = broker {
            state = state.with_broker(relay);
        }
        Ok(state)
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
