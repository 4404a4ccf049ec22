//! Deck construction and pure deck transforms.
//!
//! Every function here takes a borrowed slice and returns a fresh vector; the
//! input is never mutated. The last element of a deck is its top.

use rand::Rng;
use uuid::Uuid;

use crate::domain::{Card, Rank, Suit};

/// Result of dealing from a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dealt {
    pub card: Option<Card>,
    pub deck: Vec<Card>,
}

/// Build a fresh 52-card deck, one card per (suit, rank), all face-down.
pub fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(Suit::ALL.len() * Rank::ALL.len());
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(Uuid::new_v4().to_string(), suit, rank, false));
        }
    }
    deck
}

/// Uniform permutation of `cards` using the thread-local CSPRNG.
pub fn shuffle_deck(cards: &[Card]) -> Vec<Card> {
    shuffle_deck_with(cards, &mut rand::rng())
}

/// Fisher-Yates shuffle over a copy of `cards`.
pub fn shuffle_deck_with<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Vec<Card> {
    let mut shuffled = cards.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.random_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

/// Pop the top card. An empty deck yields `card: None` and an empty deck.
pub fn deal_card(cards: &[Card]) -> Dealt {
    let mut deck = cards.to_vec();
    let card = deck.pop();
    Dealt { card, deck }
}

pub fn remove_cards_by_rank(cards: &[Card], ranks: &[Rank]) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| !ranks.contains(&card.rank))
        .cloned()
        .collect()
}

pub fn remove_cards_by_suit(cards: &[Card], suits: &[Suit]) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| !suits.contains(&card.suit))
        .cloned()
        .collect()
}

/// Remove every card whose (suit, rank) appears in `specs`, across all decks.
pub fn remove_specific_cards(cards: &[Card], specs: &[(Suit, Rank)]) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| !specs.contains(&(card.suit, card.rank)))
        .cloned()
        .collect()
}

/// Move the element at `from` to position `to`.
///
/// An out-of-range `from` returns the input unchanged; `to` is clamped to the
/// end of the shortened sequence.
pub fn reorder_cards(cards: &[Card], from: usize, to: usize) -> Vec<Card> {
    let mut reordered = cards.to_vec();
    if from >= reordered.len() {
        return reordered;
    }
    let card = reordered.remove(from);
    let to = to.min(reordered.len());
    reordered.insert(to, card);
    reordered
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn ids(cards: &[Card]) -> Vec<String> {
        cards.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn create_deck_has_every_suit_rank_pair_face_down() {
        let deck = create_deck();
        assert_eq!(deck.len(), 52);

        let pairs: HashSet<(Suit, Rank)> = deck.iter().map(|c| (c.suit, c.rank)).collect();
        assert_eq!(pairs.len(), 52);
        assert!(deck.iter().all(|c| !c.face_up));

        let unique_ids: HashSet<&str> = deck.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(unique_ids.len(), 52);
    }

    #[test]
    fn two_decks_never_share_ids() {
        let a = create_deck();
        let b = create_deck();
        let a_ids: HashSet<String> = ids(&a).into_iter().collect();
        assert!(b.iter().all(|c| !a_ids.contains(&c.id)));
    }

    #[test]
    fn deal_card_takes_the_last_element() {
        let deck = create_deck();
        let top = deck.last().cloned();
        let dealt = deal_card(&deck);
        assert_eq!(dealt.card, top);
        assert_eq!(dealt.deck.len(), 51);
        assert_eq!(deck.len(), 52, "input untouched");
    }

    #[test]
    fn deal_card_on_empty_deck_is_idempotent() {
        let dealt = deal_card(&[]);
        assert_eq!(dealt.card, None);
        assert!(dealt.deck.is_empty());
        let again = deal_card(&dealt.deck);
        assert_eq!(again, dealt);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let deck = create_deck();
        let a = shuffle_deck_with(&deck, &mut ChaCha8Rng::seed_from_u64(7));
        let b = shuffle_deck_with(&deck, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_ne!(ids(&a), ids(&deck));
    }

    #[test]
    fn remove_by_rank_keeps_other_ranks() {
        let deck = create_deck();
        let trimmed = remove_cards_by_rank(&deck, &[Rank::Two, Rank::Three]);
        assert_eq!(trimmed.len(), 44);
        assert!(trimmed
            .iter()
            .all(|c| c.rank != Rank::Two && c.rank != Rank::Three));
    }

    #[test]
    fn remove_by_suit_keeps_other_suits() {
        let deck = create_deck();
        let trimmed = remove_cards_by_suit(&deck, &[Suit::Clubs]);
        assert_eq!(trimmed.len(), 39);
        assert!(trimmed.iter().all(|c| c.suit != Suit::Clubs));
    }

    #[test]
    fn remove_specific_hits_every_deck_copy() {
        let mut two_decks = create_deck();
        two_decks.extend(create_deck());
        let trimmed = remove_specific_cards(&two_decks, &[(Suit::Hearts, Rank::Ace)]);
        assert_eq!(trimmed.len(), 102);
    }

    #[test]
    fn reorder_moves_one_element() {
        let deck: Vec<Card> = create_deck().into_iter().take(4).collect();
        let moved = reorder_cards(&deck, 0, 2);
        assert_eq!(
            ids(&moved),
            vec![
                deck[1].id.clone(),
                deck[2].id.clone(),
                deck[0].id.clone(),
                deck[3].id.clone()
            ]
        );
    }

    #[test]
    fn reorder_with_equal_indices_is_identity() {
        let deck: Vec<Card> = create_deck().into_iter().take(5).collect();
        assert_eq!(reorder_cards(&deck, 3, 3), deck);
    }

    #[test]
    fn reorder_out_of_range_is_ignored() {
        let deck: Vec<Card> = create_deck().into_iter().take(3).collect();
        assert_eq!(reorder_cards(&deck, 9, 0), deck);
        let clamped = reorder_cards(&deck, 0, 99);
        assert_eq!(clamped.last(), deck.first());
    }

    #[test]
    fn shuffle_has_no_positional_bias() {
        const TRIALS: usize = 10_000;
        let deck = create_deck();
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        let tracked = [deck[0].id.clone(), deck[51].id.clone()];
        let mut landed = [[0usize; 52]; 2];

        for _ in 0..TRIALS {
            let shuffled = shuffle_deck_with(&deck, &mut rng);
            for (slot, id) in tracked.iter().enumerate() {
                let pos = shuffled.iter().position(|c| &c.id == id).unwrap();
                landed[slot][pos] += 1;
            }
        }

        // Chi-square over 51 degrees of freedom; 100 is far past p = 0.001.
        let expected = TRIALS as f64 / 52.0;
        for counts in &landed {
            let chi_square: f64 = counts
                .iter()
                .map(|&n| (n as f64 - expected).powi(2) / expected)
                .sum();
            assert!(chi_square < 100.0, "chi-square {chi_square}");
        }
    }
}
