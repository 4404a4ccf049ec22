//! Zone partition: every card lives in exactly one of deck, a hand, the
//! table or a group. `locate_card` is the single lookup all moves share.

use crate::domain::session::GameSession;
use crate::domain::Card;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Zone {
    Deck,
    Hand(String),
    Table,
    Group(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLocation {
    pub zone: Zone,
    pub index: usize,
}

/// Find a card by id. Search order is table, deck, hands in seat order,
/// then groups; the first hit wins.
pub fn locate_card(session: &GameSession, card_id: &str) -> Option<CardLocation> {
    if let Some(index) = session.table_cards.iter().position(|t| t.id() == card_id) {
        return Some(CardLocation {
            zone: Zone::Table,
            index,
        });
    }
    if let Some(index) = session.deck_cards.iter().position(|c| c.id == card_id) {
        return Some(CardLocation {
            zone: Zone::Deck,
            index,
        });
    }
    for player in &session.players {
        if let Some(index) = player.cards.iter().position(|c| c.id == card_id) {
            return Some(CardLocation {
                zone: Zone::Hand(player.id.clone()),
                index,
            });
        }
    }
    for group in &session.card_groups {
        if let Some(index) = group.cards.iter().position(|c| c.id == card_id) {
            return Some(CardLocation {
                zone: Zone::Group(group.id.clone()),
                index,
            });
        }
    }
    None
}

/// Remove and return the card at `location`. Returns `None` when the
/// location no longer points at a card. Emptied groups are dropped.
pub fn take_card(session: &mut GameSession, location: &CardLocation) -> Option<Card> {
    match &location.zone {
        Zone::Table => {
            (location.index < session.table_cards.len())
                .then(|| session.table_cards.remove(location.index).card)
        }
        Zone::Deck => (location.index < session.deck_cards.len())
            .then(|| session.deck_cards.remove(location.index)),
        Zone::Hand(player_id) => {
            let player = session.player_mut(player_id)?;
            (location.index < player.cards.len()).then(|| player.cards.remove(location.index))
        }
        Zone::Group(group_id) => {
            let group_index = session.card_groups.iter().position(|g| &g.id == group_id)?;
            let group = &mut session.card_groups[group_index];
            if location.index >= group.cards.len() {
                return None;
            }
            let card = group.cards.remove(location.index);
            if group.cards.is_empty() {
                session.card_groups.remove(group_index);
            }
            Some(card)
        }
    }
}

/// Sorted multiset of every card id in the room.
pub fn card_census(session: &GameSession) -> Vec<String> {
    let mut ids: Vec<String> = session.card_ids().into_iter().cloned().collect();
    ids.sort();
    ids
}
