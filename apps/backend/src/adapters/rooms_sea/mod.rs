//! SeaORM adapter for the `rooms` table.

use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::entities::rooms;
use crate::infra::db_errors::{LockInfo, OPTIMISTIC_LOCK_PREFIX, ROOM_NOT_FOUND_PREFIX};

pub mod dto;

pub use dto::{RoomCreate, RoomDocumentUpdate};

fn room_not_found(code: &str) -> sea_orm::DbErr {
    sea_orm::DbErr::Custom(format!("{ROOM_NOT_FOUND_PREFIX}{code}"))
}

pub async fn find_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Option<rooms::Model>, sea_orm::DbErr> {
    rooms::Entity::find_by_id(code.to_string()).one(conn).await
}

pub async fn create_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RoomCreate,
) -> Result<rooms::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let room = rooms::ActiveModel {
        code: Set(dto.code),
        document: Set(dto.document),
        version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    };
    room.insert(conn).await
}

/// Write the document and bump `version`. With a `current_version` the
/// update only matches that version; a miss is reported as a structured
/// `OPTIMISTIC_LOCK:` error, or `ROOM_NOT_FOUND:` when the row is gone.
pub async fn update_document<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RoomDocumentUpdate,
) -> Result<rooms::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();

    let mut update = rooms::Entity::update_many()
        .col_expr(rooms::Column::Document, Expr::val(dto.document).into())
        .col_expr(rooms::Column::UpdatedAt, Expr::val(now).into())
        .col_expr(
            rooms::Column::Version,
            Expr::col(rooms::Column::Version).add(1),
        )
        .filter(rooms::Column::Code.eq(dto.code.as_str()));
    if let Some(expected) = dto.current_version {
        update = update.filter(rooms::Column::Version.eq(expected));
    }
    let result = update.exec(conn).await?;

    if result.rows_affected == 0 {
        let current = find_by_code(conn, &dto.code).await?;
        return match (current, dto.current_version) {
            (Some(room), Some(expected)) => {
                let info = LockInfo {
                    room_code: dto.code,
                    expected,
                    actual: room.version,
                };
                let payload = serde_json::to_string(&info)
                    .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;
                Err(sea_orm::DbErr::Custom(format!(
                    "{OPTIMISTIC_LOCK_PREFIX}{payload}"
                )))
            }
            _ => Err(room_not_found(&dto.code)),
        };
    }

    find_by_code(conn, &dto.code)
        .await?
        .ok_or_else(|| room_not_found(&dto.code))
}

pub async fn delete_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<bool, sea_orm::DbErr> {
    let result = rooms::Entity::delete_by_id(code.to_string()).exec(conn).await?;
    Ok(result.rows_affected > 0)
}
