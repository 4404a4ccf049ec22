//! Room HTTP routes: lifecycle, state reads and table mutations.

use actix_web::http::header::ETAG;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::groups::CreateGroup;
use crate::domain::moves::MoveCard;
use crate::domain::player_view::project;
use crate::domain::table_ops::RemoveFromDeck;
use crate::error::AppError;
use crate::extractors::{RoomCode, ValidatedJson, ViewerQuery};
use crate::http::etag::{if_none_match_hits, room_etag};
use crate::services::table::{
    AddToGroupRequest, DealRequest, GroupModeRequest, GroupToHandRequest, MoveGroupRequest,
    ReorderRequest, UngroupRequest,
};
use crate::services::{LeaveOutcome, MutationResult};
use crate::state::app_state::AppState;
use crate::ws;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayerPath {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupPath {
    pub gid: String,
}

#[derive(Debug, Serialize)]
struct LeaveResponse {
    outcome: LeaveOutcome,
}

fn mutation(room_code: &RoomCode, result: MutationResult) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((ETAG, room_etag(room_code.as_str(), result.version)))
        .json(result)
}

/// POST /api/rooms
async fn create_room(
    body: ValidatedJson<NameRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let joined = app_state.rooms.create_room(&body.name).await?;
    Ok(HttpResponse::Created()
        .insert_header((ETAG, room_etag(&joined.room_code, joined.version)))
        .json(joined))
}

/// POST /api/rooms/{code}/players
async fn join_room(
    room_code: RoomCode,
    body: ValidatedJson<NameRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let joined = app_state
        .rooms
        .join_room(room_code.as_str(), &body.name)
        .await?;
    Ok(HttpResponse::Created()
        .insert_header((ETAG, room_etag(&joined.room_code, joined.version)))
        .json(joined))
}

/// DELETE /api/rooms/{code}/players/{player_id}
async fn leave_room(
    room_code: RoomCode,
    path: web::Path<PlayerPath>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let outcome = app_state
        .rooms
        .leave_room(room_code.as_str(), &path.player_id)
        .await?;
    Ok(HttpResponse::Ok().json(LeaveResponse { outcome }))
}

/// GET /api/rooms/{code}?viewer={player_id}
///
/// Returns the room projected for the viewer with an ETag naming the store
/// version. A matching `If-None-Match` yields `304 Not Modified`.
async fn get_room(
    http_req: HttpRequest,
    room_code: RoomCode,
    query: web::Query<ViewerQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session = app_state.sync.load(room_code.as_str()).await?;
    let etag_value = room_etag(room_code.as_str(), session.version);

    if if_none_match_hits(http_req.headers(), &etag_value) {
        return Ok(HttpResponse::build(StatusCode::NOT_MODIFIED)
            .insert_header((ETAG, etag_value))
            .finish());
    }

    Ok(HttpResponse::Ok()
        .insert_header((ETAG, etag_value))
        .json(project(&session, query.viewer())))
}

/// POST /api/rooms/{code}/deck/deal
async fn deal(
    room_code: RoomCode,
    body: ValidatedJson<DealRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state.table.deal(room_code.as_str(), &body).await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/deck/shuffle
async fn shuffle(
    room_code: RoomCode,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state.table.shuffle(room_code.as_str()).await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/deck/add
async fn add_deck(
    room_code: RoomCode,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state.table.add_deck(room_code.as_str()).await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/deck/remove
async fn remove_from_deck(
    room_code: RoomCode,
    body: ValidatedJson<RemoveFromDeck>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .remove_from_deck(room_code.as_str(), &body)
        .await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/reset
async fn reset(
    room_code: RoomCode,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state.table.reset(room_code.as_str()).await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/moves
async fn move_card(
    room_code: RoomCode,
    body: ValidatedJson<MoveCard>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state.table.move_card(room_code.as_str(), &body).await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/players/{player_id}/reorder
async fn reorder_hand(
    room_code: RoomCode,
    path: web::Path<PlayerPath>,
    body: ValidatedJson<ReorderRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .reorder_hand(room_code.as_str(), &path.player_id, body.into_inner())
        .await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/groups
async fn create_group(
    room_code: RoomCode,
    body: ValidatedJson<CreateGroup>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .create_group(room_code.as_str(), &body)
        .await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/groups/{gid}/cards
async fn add_to_group(
    room_code: RoomCode,
    path: web::Path<GroupPath>,
    body: ValidatedJson<AddToGroupRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .add_to_group(room_code.as_str(), &path.gid, &body)
        .await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/groups/{gid}/remove
async fn remove_from_group(
    room_code: RoomCode,
    path: web::Path<GroupPath>,
    body: ValidatedJson<UngroupRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .remove_from_group(room_code.as_str(), &path.gid, body.into_inner())
        .await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/groups/{gid}/to-hand
async fn group_to_hand(
    room_code: RoomCode,
    path: web::Path<GroupPath>,
    body: ValidatedJson<GroupToHandRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .group_to_hand(room_code.as_str(), &path.gid, &body)
        .await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/groups/{gid}/move
async fn move_group(
    room_code: RoomCode,
    path: web::Path<GroupPath>,
    body: ValidatedJson<MoveGroupRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .move_group(room_code.as_str(), &path.gid, body.into_inner())
        .await?;
    Ok(mutation(&room_code, result))
}

/// POST /api/rooms/{code}/groups/{gid}/mode
async fn set_group_mode(
    room_code: RoomCode,
    path: web::Path<GroupPath>,
    body: ValidatedJson<GroupModeRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let result = app_state
        .table
        .set_group_mode(room_code.as_str(), &path.gid, body.into_inner())
        .await?;
    Ok(mutation(&room_code, result))
}

/// Mounted under `/api/rooms`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_room)));
    cfg.service(web::resource("/{code}").route(web::get().to(get_room)));
    cfg.service(web::resource("/{code}/ws").route(web::get().to(ws::upgrade)));
    cfg.service(web::resource("/{code}/players").route(web::post().to(join_room)));
    cfg.service(web::resource("/{code}/players/{player_id}").route(web::delete().to(leave_room)));
    cfg.service(
        web::resource("/{code}/players/{player_id}/reorder").route(web::post().to(reorder_hand)),
    );
    cfg.service(web::resource("/{code}/deck/deal").route(web::post().to(deal)));
    cfg.service(web::resource("/{code}/deck/shuffle").route(web::post().to(shuffle)));
    cfg.service(web::resource("/{code}/deck/add").route(web::post().to(add_deck)));
    cfg.service(web::resource("/{code}/deck/remove").route(web::post().to(remove_from_deck)));
    cfg.service(web::resource("/{code}/reset").route(web::post().to(reset)));
    cfg.service(web::resource("/{code}/moves").route(web::post().to(move_card)));
    cfg.service(web::resource("/{code}/groups").route(web::post().to(create_group)));
    cfg.service(web::resource("/{code}/groups/{gid}/cards").route(web::post().to(add_to_group)));
    cfg.service(
        web::resource("/{code}/groups/{gid}/remove").route(web::post().to(remove_from_group)),
    );
    cfg.service(web::resource("/{code}/groups/{gid}/to-hand").route(web::post().to(group_to_hand)));
    cfg.service(web::resource("/{code}/groups/{gid}/move").route(web::post().to(move_group)));
    cfg.service(web::resource("/{code}/groups/{gid}/mode").route(web::post().to(set_group_mode)));
}
