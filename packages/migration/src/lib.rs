//! Schema migrations for the card table backend.

pub use sea_orm_migration::prelude::*;
pub use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseConnection};
use sea_orm_migration::sea_orm::{DatabaseBackend, Statement};

mod m20260901_000001_rooms;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260901_000001_rooms::Migration)]
    }
}

/// Apply every pending migration, logging applied counts before and after.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let database = database_name(db).await;
    let applied_before = count_applied_migrations(db).await?;
    tracing::info!(
        backend = ?db.get_database_backend(),
        database = %database,
        defined = Migrator::migrations().len(),
        applied = applied_before,
        "Applying migrations"
    );

    if let Err(e) = Migrator::up(db, None).await {
        tracing::error!(database = %database, error = %e, "Migration failed");
        return Err(e);
    }

    let applied_after = count_applied_migrations(db).await?;
    tracing::info!(
        applied = applied_after,
        newly_applied = applied_after.saturating_sub(applied_before),
        "Migrations up to date"
    );
    Ok(())
}

/// Best-effort database name for logs.
async fn database_name(db: &DatabaseConnection) -> String {
    let backend = db.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Postgres => "SELECT current_database() AS name",
        DatabaseBackend::Sqlite => "SELECT file AS name FROM pragma_database_list WHERE name = 'main'",
        _ => return "<unsupported>".to_string(),
    };
    match db.query_one(Statement::from_string(backend, sql.to_string())).await {
        Ok(Some(row)) => match row.try_get::<String>("", "name") {
            Ok(name) if name.is_empty() => ":memory:".to_string(),
            Ok(name) => name,
            Err(_) => "<unknown>".to_string(),
        },
        _ => "<unknown>".to_string(),
    }
}

/// Applied migration count; 0 before the migration table exists.
pub async fn count_applied_migrations(db: &DatabaseConnection) -> Result<usize, DbErr> {
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.len()),
        Err(DbErr::Exec(_)) | Err(DbErr::Query(_)) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Name of the most recent applied migration, if any.
pub async fn get_latest_migration_version(db: &DatabaseConnection) -> Result<Option<String>, DbErr> {
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.last().map(|m| m.name().to_string())),
        Err(DbErr::Exec(_)) | Err(DbErr::Query(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
