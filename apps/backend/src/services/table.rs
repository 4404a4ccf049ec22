//! Table mutations: deck controls, card moves, hand reordering and groups.
//!
//! Every call runs through [`SyncService::update_room`]. References inside a
//! request body that no longer hold come back as `applied: false`; a player
//! or group named in the request path must exist.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::groups::{
    add_card_to_group, create_group, move_card_from_group_to_hand, move_group,
    remove_card_from_group, set_group_mode, CreateGroup,
};
use crate::domain::moves::{move_card, MoveCard};
use crate::domain::session::{GameSession, GroupMode};
use crate::domain::table_ops::{
    add_deck, deal_to_player, remove_from_deck, reorder_hand, reset_table, shuffle,
    RemoveFromDeck,
};
use crate::domain::MoveOutcome;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::services::sync::{SyncService, Synced};

/// Body returned by every table mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    pub applied: bool,
    pub message: String,
    pub version: i32,
}

impl MutationResult {
    fn from_outcome(synced: Synced<MoveOutcome>) -> Self {
        let message = match synced.outcome {
            MoveOutcome::Applied => "ok".to_string(),
            MoveOutcome::NoOp(reason) => reason.as_str().to_string(),
            MoveOutcome::DeckEmpty => "deck_empty".to_string(),
        };
        Self {
            applied: synced.outcome.is_applied(),
            message,
            version: synced.session.version,
        }
    }

    fn applied(message: String, version: i32) -> Self {
        Self {
            applied: true,
            message,
            version,
        }
    }
}

fn settle(outcome: MoveOutcome) -> Result<MoveOutcome, DomainError> {
    match outcome {
        MoveOutcome::DeckEmpty => Err(DomainError::exhausted("The deck is empty")),
        other => Ok(other),
    }
}

fn require_player(session: &GameSession, player_id: &str) -> Result<(), DomainError> {
    session.player(player_id).map(|_| ()).ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Player,
            format!("player {player_id} is not in room {}", session.room_id),
        )
    })
}

fn require_group(session: &GameSession, group_id: &str) -> Result<(), DomainError> {
    if session.card_groups.iter().any(|g| g.id == group_id) {
        Ok(())
    } else {
        Err(DomainError::not_found(
            NotFoundKind::Group,
            format!("group {group_id} is not on the table in room {}", session.room_id),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddToGroupRequest {
    #[serde(rename = "cardId")]
    pub card_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UngroupRequest {
    pub index: usize,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupToHandRequest {
    pub index: usize,
    pub player_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveGroupRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupModeRequest {
    pub mode: GroupMode,
}

#[derive(Clone)]
pub struct TableService {
    sync: SyncService,
}

impl TableService {
    pub fn new(sync: SyncService) -> Self {
        Self { sync }
    }

    async fn run<F>(&self, room_code: &str, mut op: F) -> Result<MutationResult, AppError>
    where
        F: FnMut(&mut GameSession) -> Result<MoveOutcome, DomainError>,
    {
        let synced = self
            .sync
            .update_room(room_code, |session| settle(op(session)?))
            .await?;
        Ok(MutationResult::from_outcome(synced))
    }

    /// Deal the top deck card face-up into a player's hand.
    pub async fn deal(&self, room_code: &str, req: &DealRequest) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| Ok(deal_to_player(session, &req.player_id)))
            .await
    }

    pub async fn shuffle(&self, room_code: &str) -> Result<MutationResult, AppError> {
        let synced = self
            .sync
            .update_room(room_code, |session| {
                shuffle(session, &mut rand::rng());
                Ok(session.deck_cards.len())
            })
            .await?;
        Ok(MutationResult::applied(
            format!("shuffled {} cards", synced.outcome),
            synced.session.version,
        ))
    }

    pub async fn add_deck(&self, room_code: &str) -> Result<MutationResult, AppError> {
        let synced = self
            .sync
            .update_room(room_code, |session| Ok(add_deck(session)))
            .await?;
        info!(room_code, deck_size = synced.session.deck_cards.len(), "Added a fresh deck");
        Ok(MutationResult::applied(
            format!("added {} cards", synced.outcome),
            synced.session.version,
        ))
    }

    pub async fn remove_from_deck(
        &self,
        room_code: &str,
        criteria: &RemoveFromDeck,
    ) -> Result<MutationResult, AppError> {
        let synced = self
            .sync
            .update_room(room_code, |session| Ok(remove_from_deck(session, criteria)))
            .await?;
        Ok(MutationResult::applied(
            format!("removed {} cards", synced.outcome),
            synced.session.version,
        ))
    }

    pub async fn reset(&self, room_code: &str) -> Result<MutationResult, AppError> {
        let synced = self
            .sync
            .update_room(room_code, |session| {
                reset_table(session, &mut rand::rng());
                Ok(session.deck_cards.len())
            })
            .await?;
        info!(room_code, deck_size = synced.outcome, "Table reset");
        Ok(MutationResult::applied(
            format!("gathered {} cards", synced.outcome),
            synced.session.version,
        ))
    }

    pub async fn move_card(&self, room_code: &str, req: &MoveCard) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| Ok(move_card(session, req)))
            .await
    }

    pub async fn reorder_hand(
        &self,
        room_code: &str,
        player_id: &str,
        req: ReorderRequest,
    ) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| {
            require_player(session, player_id)?;
            Ok(reorder_hand(session, player_id, req.from, req.to))
        })
        .await
    }

    pub async fn create_group(&self, room_code: &str, req: &CreateGroup) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| Ok(create_group(session, req)))
            .await
    }

    pub async fn add_to_group(
        &self,
        room_code: &str,
        group_id: &str,
        req: &AddToGroupRequest,
    ) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| {
            require_group(session, group_id)?;
            Ok(add_card_to_group(session, group_id, &req.card_id))
        })
        .await
    }

    pub async fn remove_from_group(
        &self,
        room_code: &str,
        group_id: &str,
        req: UngroupRequest,
    ) -> Result<MutationResult, AppError> {
        let drop_at = req.x.zip(req.y);
        self.run(room_code, |session| {
            require_group(session, group_id)?;
            Ok(remove_card_from_group(session, group_id, req.index, drop_at))
        })
        .await
    }

    pub async fn group_to_hand(
        &self,
        room_code: &str,
        group_id: &str,
        req: &GroupToHandRequest,
    ) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| {
            require_group(session, group_id)?;
            Ok(move_card_from_group_to_hand(
                session,
                group_id,
                req.index,
                &req.player_id,
            ))
        })
        .await
    }

    pub async fn move_group(
        &self,
        room_code: &str,
        group_id: &str,
        req: MoveGroupRequest,
    ) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| {
            require_group(session, group_id)?;
            Ok(move_group(session, group_id, req.x, req.y))
        })
        .await
    }

    pub async fn set_group_mode(
        &self,
        room_code: &str,
        group_id: &str,
        req: GroupModeRequest,
    ) -> Result<MutationResult, AppError> {
        self.run(room_code, |session| {
            require_group(session, group_id)?;
            Ok(set_group_mode(session, group_id, req.mode))
        })
        .await
    }
}
