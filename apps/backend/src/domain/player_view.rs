//! Per-viewer projection of a room.
//!
//! A viewer sees their own hand in full and every face-up card elsewhere.
//! Other players' hands and face-down cards keep their ids but lose suit
//! and rank. The deck exposes its size and the top card only.

use serde::Serialize;

use crate::domain::session::{CardGroup, GameSession, GroupMode, Player, TableCard};
use crate::domain::{Card, Rank, Suit};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit: Option<Suit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
    pub face_up: bool,
}

impl CardView {
    fn revealed(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            suit: Some(card.suit),
            rank: Some(card.rank),
            face_up: card.face_up,
        }
    }

    fn hidden(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            suit: None,
            rank: None,
            face_up: false,
        }
    }

    fn as_shown(card: &Card) -> Self {
        if card.face_up {
            Self::revealed(card)
        } else {
            Self::hidden(card)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCardView {
    #[serde(flatten)]
    pub card: CardView,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub position: usize,
    pub card_count: usize,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub id: String,
    pub cards: Vec<CardView>,
    pub x: f64,
    pub y: f64,
    pub mode: GroupMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckView {
    pub count: usize,
    pub top: Option<CardView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_id: String,
    pub viewer_id: Option<String>,
    pub players: Vec<PlayerView>,
    pub deck: DeckView,
    pub table_cards: Vec<TableCardView>,
    pub card_groups: Vec<GroupView>,
    pub last_update: i64,
    pub version: i32,
}

fn player_view(player: &Player, viewer: Option<&str>) -> PlayerView {
    let own = viewer == Some(player.id.as_str());
    let cards = player
        .cards
        .iter()
        .map(|card| {
            if own {
                CardView::revealed(card)
            } else {
                CardView::hidden(card)
            }
        })
        .collect();
    PlayerView {
        id: player.id.clone(),
        name: player.name.clone(),
        position: player.position,
        card_count: player.cards.len(),
        cards,
    }
}

fn table_view(table: &TableCard) -> TableCardView {
    TableCardView {
        card: CardView::as_shown(&table.card),
        x: table.x,
        y: table.y,
    }
}

fn group_view(group: &CardGroup) -> GroupView {
    GroupView {
        id: group.id.clone(),
        cards: group.cards.iter().map(CardView::as_shown).collect(),
        x: group.x,
        y: group.y,
        mode: group.mode,
    }
}

/// Project `session` for `viewer`. `None` yields the spectator view.
pub fn project(session: &GameSession, viewer: Option<&str>) -> RoomView {
    RoomView {
        room_id: session.room_id.clone(),
        viewer_id: viewer.map(str::to_string),
        players: session
            .players
            .iter()
            .map(|p| player_view(p, viewer))
            .collect(),
        deck: DeckView {
            count: session.deck_cards.len(),
            top: session.deck_cards.last().map(CardView::as_shown),
        },
        table_cards: session.table_cards.iter().map(table_view).collect(),
        card_groups: session.card_groups.iter().map(group_view).collect(),
        last_update: session.last_update,
        version: session.version,
    }
}
