//! The room document: players, deck, loose table cards and card groups.
//!
//! `GameSession` is the aggregate root persisted as one JSON document per
//! room. Collections that a document store drops when empty (or writes as
//! `null`) deserialize to empty vectors.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Card, CardId};
use crate::errors::domain::{DomainError, InfraErrorKind};

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: usize,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub cards: Vec<Card>,
}

/// A loose card on the table surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCard {
    #[serde(flatten)]
    pub card: Card,
    pub x: f64,
    pub y: f64,
}

impl TableCard {
    pub fn new(card: Card, x: f64, y: f64) -> Self {
        Self { card, x, y }
    }

    pub fn id(&self) -> &str {
        &self.card.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    #[default]
    Fan,
    Stack,
}

/// Cards that share one table position. A group never survives empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardGroup {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub cards: Vec<Card>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub mode: GroupMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub room_id: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub players: Vec<Player>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub deck_cards: Vec<Card>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub table_cards: Vec<TableCard>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub card_groups: Vec<CardGroup>,
    #[serde(default)]
    pub last_update: i64,
    /// Write counter owned by the room store.
    #[serde(default)]
    pub version: i32,
}

impl GameSession {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            players: Vec::new(),
            deck_cards: Vec::new(),
            table_cards: Vec::new(),
            card_groups: Vec::new(),
            last_update: now_millis(),
            version: 0,
        }
    }

    /// Parse a stored document, defaulting every missing collection.
    pub fn from_document(doc: serde_json::Value) -> Result<Self, DomainError> {
        let mut session: GameSession = serde_json::from_value(doc).map_err(|e| {
            DomainError::infra(
                InfraErrorKind::DataCorruption,
                format!("room document is malformed: {e}"),
            )
        })?;
        session.normalize();
        Ok(session)
    }

    pub fn to_document(&self) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(self).map_err(|e| {
            DomainError::infra(
                InfraErrorKind::DataCorruption,
                format!("room document could not be encoded: {e}"),
            )
        })
    }

    /// Restore the structural invariants: seats are numbered `0..n` in list
    /// order and no empty group is kept.
    pub fn normalize(&mut self) {
        for (index, player) in self.players.iter_mut().enumerate() {
            player.position = index;
        }
        self.card_groups.retain(|group| !group.cards.is_empty());
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn group_mut(&mut self, group_id: &str) -> Option<&mut CardGroup> {
        self.card_groups.iter_mut().find(|g| g.id == group_id)
    }

    /// Every card id in the room, in zone order: deck, hands, table, groups.
    pub fn card_ids(&self) -> Vec<&CardId> {
        self.deck_cards
            .iter()
            .chain(self.players.iter().flat_map(|p| p.cards.iter()))
            .chain(self.table_cards.iter().map(|t| &t.card))
            .chain(self.card_groups.iter().flat_map(|g| g.cards.iter()))
            .map(|card| &card.id)
            .collect()
    }

    pub fn card_count(&self) -> usize {
        self.deck_cards.len()
            + self.players.iter().map(|p| p.cards.len()).sum::<usize>()
            + self.table_cards.len()
            + self.card_groups.iter().map(|g| g.cards.len()).sum::<usize>()
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    let now = time::OffsetDateTime::now_utc();
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}
