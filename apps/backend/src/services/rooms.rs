//! Room lifecycle: create, join and leave.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::rooms::RoomsConfig;
use crate::domain::deck::{create_deck, shuffle_deck};
use crate::domain::session::{GameSession, Player};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::services::sync::SyncService;
use crate::store::StoreError;
use crate::utils::room_code::generate_room_code;

pub const MAX_NAME_LEN: usize = 32;

/// Identifies the caller's seat after creating or joining a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoined {
    pub room_code: String,
    pub player_id: String,
    pub position: usize,
    pub version: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOutcome {
    Left,
    RoomClosed,
}

fn display_name(raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Player name must not be blank"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "Player name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn new_player(name: String, position: usize) -> Player {
    Player {
        id: Uuid::new_v4().to_string(),
        name,
        position,
        cards: Vec::new(),
    }
}

#[derive(Clone)]
pub struct RoomService {
    sync: SyncService,
    config: RoomsConfig,
}

impl RoomService {
    pub fn new(sync: SyncService, config: RoomsConfig) -> Self {
        Self { sync, config }
    }

    /// Open a room with the creator seated at position 0.
    pub async fn create_room(&self, creator_name: &str) -> Result<RoomJoined, AppError> {
        let name = display_name(creator_name)?;

        for attempt in 1..=self.config.code_attempts {
            let room_code = generate_room_code();
            let mut session = GameSession::new(room_code.clone());
            let creator = new_player(name.clone(), 0);
            let player_id = creator.id.clone();
            session.players.push(creator);
            if self.config.seed_deck_on_create {
                session.deck_cards = shuffle_deck(&create_deck());
            }

            match self.sync.create(&session).await? {
                Ok(created) => {
                    info!(room_code = %room_code, player_id = %player_id, deck = created.deck_cards.len(), "Room created");
                    return Ok(RoomJoined {
                        room_code,
                        player_id,
                        position: 0,
                        version: created.version,
                    });
                }
                Err(StoreError::AlreadyExists(_)) => {
                    warn!(room_code = %room_code, attempt, "Room code collision, drawing another");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict(
            ConflictKind::RoomCodeTaken,
            format!(
                "No free room code found after {} attempts",
                self.config.code_attempts
            ),
        )
        .into())
    }

    /// Seat a new player after everyone already in the room.
    pub async fn join_room(&self, room_code: &str, name: &str) -> Result<RoomJoined, AppError> {
        let name = display_name(name)?;
        let player = new_player(name, 0);
        let player_id = player.id.clone();

        let synced = self
            .sync
            .update_room(room_code, |session| {
                let mut seat = player.clone();
                seat.position = session.players.len();
                session.players.push(seat);
                Ok(session.players.len() - 1)
            })
            .await?;

        info!(room_code, player_id = %player_id, position = synced.outcome, "Player joined");
        Ok(RoomJoined {
            room_code: room_code.to_string(),
            player_id,
            position: synced.outcome,
            version: synced.session.version,
        })
    }

    /// Remove a player. Their hand goes face-down onto the deck top. The
    /// last player out deletes the room.
    pub async fn leave_room(&self, room_code: &str, player_id: &str) -> Result<LeaveOutcome, AppError> {
        let synced = self
            .sync
            .patch_room(room_code, |session| {
                let Some(leaving) = session.player(player_id) else {
                    return Err(DomainError::not_found(
                        NotFoundKind::Player,
                        format!("player {player_id} is not in room {room_code}"),
                    ));
                };

                let mut deck = session.deck_cards.clone();
                deck.extend(leaving.cards.iter().cloned().map(|card| card.with_face(false)));

                let players: Vec<Player> = session
                    .players
                    .iter()
                    .filter(|p| p.id != player_id)
                    .cloned()
                    .enumerate()
                    .map(|(position, mut p)| {
                        p.position = position;
                        p
                    })
                    .collect();
                let remaining = players.len();

                let mut fields = Map::new();
                fields.insert("players".into(), to_json(&players)?);
                fields.insert("deckCards".into(), to_json(&deck)?);
                Ok((fields, remaining))
            })
            .await?;

        if synced.outcome > 0 {
            info!(room_code, player_id, remaining = synced.outcome, "Player left");
            return Ok(LeaveOutcome::Left);
        }

        self.sync.delete_room(room_code).await?;
        info!(room_code, player_id, "Last player left, room closed");
        Ok(LeaveOutcome::RoomClosed)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("room fields could not be encoded: {e}"),
        )
    })
}
