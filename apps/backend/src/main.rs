use actix_web::{web, App, HttpServer};
use cardtable::config::db::DbProfile;
use cardtable::config::rooms::RoomsConfig;
use cardtable::config::store::{redis_url, StoreKind};
use cardtable::config::sync::SyncConfig;
use cardtable::infra::state::build_state;
use cardtable::middleware::cors::cors_middleware;
use cardtable::middleware::request_trace::RequestTrace;
use cardtable::middleware::structured_logger::StructuredLogger;
use cardtable::middleware::trace_span::TraceSpan;
use cardtable::routes;
use cardtable::AppError;
use tracing::{error, info};

mod telemetry;

fn load_config() -> Result<(StoreKind, SyncConfig, RoomsConfig), AppError> {
    Ok((
        StoreKind::from_env()?,
        SyncConfig::from_env()?,
        RoomsConfig::from_env()?,
    ))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (docker env_file, or `set -a; . ./.env; set +a` locally).
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
    {
        Ok(port) => port,
        Err(_) => {
            error!("BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        }
    };

    let (store_kind, sync_config, rooms_config) = match load_config() {
        Ok(parts) => parts,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let mut builder = build_state()
        .with_sync_config(sync_config)
        .with_rooms_config(rooms_config);
    if store_kind == StoreKind::Database {
        builder = builder.with_db(DbProfile::Prod);
    }
    if let Some(url) = redis_url() {
        builder = builder.with_redis(url);
    }

    let app_state = match builder.build().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to build application state");
            std::process::exit(1);
        }
    };

    info!(host = %host, port, store = ?store_kind, "Starting card table backend");

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
