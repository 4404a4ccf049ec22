use migration::migrate;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::db::{db_url, DbOwner, DbProfile};
use crate::error::AppError;

/// Open a connection for `profile`. Does not run migrations.
pub async fn connect_db(
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let mut options = ConnectOptions::new(db_url(profile, owner)?);
    options.sqlx_logging(false);
    if profile == DbProfile::InMemory {
        // Every SQLite memory connection is its own database.
        options.max_connections(1).min_connections(1);
    }

    Database::connect(options)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to connect to database: {e}")))
}

/// Connect and bring the schema up to date.
pub async fn bootstrap_db(
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(profile, owner).await?;
    migrate(&conn)
        .await
        .map_err(|e| AppError::db(format!("Migration failed: {e}")))?;
    info!(profile = ?profile, "Database ready");
    Ok(conn)
}
