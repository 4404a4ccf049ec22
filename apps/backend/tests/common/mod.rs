#![allow(dead_code)]

// tests/common/mod.rs
use std::sync::Arc;

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use cardtable::config::rooms::RoomsConfig;
use cardtable::config::sync::SyncConfig;
use cardtable::infra::state::build_state;
use cardtable::store::{InMemoryRoomStore, RoomStore};
use cardtable::AppState;
use serde_json::Value;

// Logging is auto-installed for most test binaries
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// State over a fresh in-memory store; decks are not seeded so tests
/// control every card.
pub async fn memory_state() -> AppState {
    memory_state_with(SyncConfig::default()).await
}

pub async fn memory_state_with(sync: SyncConfig) -> AppState {
    let store: Arc<dyn RoomStore> = Arc::new(InMemoryRoomStore::new());
    build_state()
        .with_store(store)
        .with_sync_config(sync)
        .with_rooms_config(RoomsConfig::default().without_seed_deck())
        .build()
        .await
        .expect("memory state builds")
}

/// An actix test service wired the way `main.rs` wires the real server,
/// minus CORS.
#[macro_export]
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(cardtable::middleware::StructuredLogger)
                .wrap(cardtable::middleware::TraceSpan)
                .wrap(cardtable::middleware::RequestTrace)
                .app_data(actix_web::web::Data::new($state))
                .configure(cardtable::routes::configure),
        )
        .await
    };
}

pub async fn read_json(resp: ServiceResponse<BoxBody>) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).expect("response body is JSON")
}
