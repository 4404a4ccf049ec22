//! Property tests: only deck additions and removals change which cards exist.

use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::deck::{reorder_cards, shuffle_deck_with};
use crate::domain::moves::MoveOutcome;
use crate::domain::session::GameSession;
use crate::domain::table_ops::{deal_to_player, reset_table};
use crate::domain::test_gens::{apply_op, session, table_op, TableOp};
use crate::domain::test_prelude;
use crate::domain::zones::card_census;

fn ids_are_unique(s: &GameSession) -> bool {
    let ids = s.card_ids();
    let unique: HashSet<_> = ids.iter().collect();
    unique.len() == ids.len()
}

proptest! {
    #![proptest_config(test_prelude::proptest_config())]

    #[test]
    fn op_sequences_account_for_every_card(
        start in session(),
        ops in prop::collection::vec(table_op(), 0..24),
    ) {
        let start_count = start.card_ids().len();
        let mut expected = card_census(&start);
        let (mut added, mut removed) = (0usize, 0usize);
        let mut s = start;

        for op in &ops {
            let deck_before: Vec<String> = s.deck_cards.iter().map(|c| c.id.clone()).collect();
            let outcome = apply_op(&mut s, op);
            s.normalize();

            match op {
                TableOp::AddDeck => {
                    let below: Vec<String> = s.deck_cards[..deck_before.len()]
                        .iter()
                        .map(|c| c.id.clone())
                        .collect();
                    prop_assert_eq!(&below, &deck_before);
                    let fresh: Vec<String> = s.deck_cards[deck_before.len()..]
                        .iter()
                        .map(|c| c.id.clone())
                        .collect();
                    prop_assert_eq!(fresh.len(), 52);
                    added += fresh.len();
                    expected.extend(fresh);
                    expected.sort();
                }
                TableOp::RemoveFromDeck(_) => {
                    let kept: HashSet<&String> = s.deck_cards.iter().map(|c| &c.id).collect();
                    let gone: Vec<&String> =
                        deck_before.iter().filter(|id| !kept.contains(id)).collect();
                    removed += gone.len();
                    expected.retain(|id| !gone.contains(&id));
                }
                _ => {}
            }

            if outcome == MoveOutcome::DeckEmpty {
                prop_assert!(s.deck_cards.is_empty());
            }
            prop_assert_eq!(&card_census(&s), &expected);
            prop_assert_eq!(s.card_ids().len(), start_count + added - removed);
            prop_assert!(ids_are_unique(&s));
            prop_assert!(s.card_groups.iter().all(|g| !g.cards.is_empty()));
        }
    }

    #[test]
    fn player_positions_stay_contiguous(
        start in session(),
        ops in prop::collection::vec(table_op(), 0..12),
    ) {
        let mut s = start;
        for op in &ops {
            apply_op(&mut s, op);
            s.normalize();
        }
        for (index, player) in s.players.iter().enumerate() {
            prop_assert_eq!(player.position, index);
        }
    }

    #[test]
    fn shuffle_is_a_permutation(start in session(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let shuffled = shuffle_deck_with(&start.deck_cards, &mut rng);

        let mut before: Vec<_> = start.deck_cards.iter().map(|c| c.id.clone()).collect();
        let mut after: Vec<_> = shuffled.iter().map(|c| c.id.clone()).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn dealing_shrinks_the_deck_by_at_most_one(start in session()) {
        let mut s = start;
        let before = s.deck_cards.len();
        let outcome = deal_to_player(&mut s, "p0");

        if before == 0 {
            prop_assert_eq!(outcome, MoveOutcome::DeckEmpty);
            prop_assert_eq!(s.deck_cards.len(), 0);
        } else {
            prop_assert!(outcome.is_applied());
            prop_assert_eq!(s.deck_cards.len(), before - 1);
        }
    }

    #[test]
    fn reorder_to_same_index_is_identity(start in session(), index in 0usize..8) {
        let cards = &start.deck_cards;
        let reordered = reorder_cards(cards, index, index);
        prop_assert_eq!(&reordered, cards);
    }

    #[test]
    fn reset_keeps_every_card(start in session(), seed in any::<u64>()) {
        let census = card_census(&start);
        let mut s = start;
        reset_table(&mut s, &mut ChaCha8Rng::seed_from_u64(seed));

        prop_assert_eq!(card_census(&s), census);
        prop_assert!(s.deck_cards.iter().all(|c| !c.face_up));
    }
}
