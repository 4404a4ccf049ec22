//! Whole-table operations triggered from the deck controls and hands.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::deck::{
    create_deck, remove_cards_by_rank, remove_cards_by_suit, remove_specific_cards, reorder_cards,
    shuffle_deck_with,
};
use crate::domain::moves::{move_card, DestZone, MoveCard, MoveOutcome, SourceZone, StaleReason};
use crate::domain::session::GameSession;
use crate::domain::{Rank, Suit};

/// Deal the top of the deck into a player's hand, face-up.
pub fn deal_to_player(session: &mut GameSession, player_id: &str) -> MoveOutcome {
    move_card(
        session,
        &MoveCard {
            card_id: String::new(),
            from: SourceZone::Deck,
            to: DestZone::Hand,
            to_player_id: Some(player_id.to_string()),
            face_up: Some(true),
            x: None,
            y: None,
        },
    )
}

pub fn shuffle<R: Rng + ?Sized>(session: &mut GameSession, rng: &mut R) {
    session.deck_cards = shuffle_deck_with(&session.deck_cards, rng);
}

/// Stack a fresh 52-card deck on top of the current deck.
pub fn add_deck(session: &mut GameSession) -> usize {
    let fresh = create_deck();
    let added = fresh.len();
    session.deck_cards.extend(fresh);
    added
}

/// Deck filter criteria. A card is removed when its suit or its rank is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromDeck {
    #[serde(default)]
    pub suits: Vec<Suit>,
    #[serde(default)]
    pub ranks: Vec<Rank>,
    #[serde(default)]
    pub cards: Vec<CardSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSpec {
    pub suit: Suit,
    pub rank: Rank,
}

/// Remove matching cards from the deck only; hands, table and groups are
/// untouched. Returns how many cards were destroyed.
pub fn remove_from_deck(session: &mut GameSession, criteria: &RemoveFromDeck) -> usize {
    let before = session.deck_cards.len();
    let mut deck = std::mem::take(&mut session.deck_cards);
    if !criteria.suits.is_empty() {
        deck = remove_cards_by_suit(&deck, &criteria.suits);
    }
    if !criteria.ranks.is_empty() {
        deck = remove_cards_by_rank(&deck, &criteria.ranks);
    }
    if !criteria.cards.is_empty() {
        let specs: Vec<(Suit, Rank)> = criteria.cards.iter().map(|c| (c.suit, c.rank)).collect();
        deck = remove_specific_cards(&deck, &specs);
    }
    session.deck_cards = deck;
    before - session.deck_cards.len()
}

pub fn reorder_hand(
    session: &mut GameSession,
    player_id: &str,
    from: usize,
    to: usize,
) -> MoveOutcome {
    let Some(player) = session.player_mut(player_id) else {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    };
    if from >= player.cards.len() {
        return MoveOutcome::NoOp(StaleReason::IndexOutOfRange);
    }
    player.cards = reorder_cards(&player.cards, from, to);
    MoveOutcome::Applied
}

/// Gather every card in the room back into one face-down shuffled deck.
pub fn reset_table<R: Rng + ?Sized>(session: &mut GameSession, rng: &mut R) {
    let mut gathered = std::mem::take(&mut session.deck_cards);
    gathered.extend(
        std::mem::take(&mut session.table_cards)
            .into_iter()
            .map(|t| t.card),
    );
    for group in std::mem::take(&mut session.card_groups) {
        gathered.extend(group.cards);
    }
    for player in &mut session.players {
        gathered.append(&mut player.cards);
    }
    for card in &mut gathered {
        card.face_up = false;
    }
    session.deck_cards = shuffle_deck_with(&gathered, rng);
}
