// Proptest generators for table sessions and table operations.
// References to cards, groups and players are indices resolved against the
// live session at apply time, so generated sequences stay meaningful while
// still producing stale references.

use proptest::prelude::*;

use crate::domain::groups::{
    add_card_to_group, create_group, move_card_from_group_to_hand, remove_card_from_group,
    CreateGroup,
};
use crate::domain::moves::{move_card, DestZone, MoveCard, MoveOutcome, SourceZone};
use crate::domain::session::{CardGroup, GameSession, GroupMode, Player, TableCard};
use crate::domain::table_ops::{
    add_deck, remove_from_deck, reorder_hand, CardSpec, RemoveFromDeck,
};
use crate::domain::{Card, Rank, Suit};

const STALE: &str = "stale-ref";

pub fn suit() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::ALL.to_vec())
}

pub fn rank() -> impl Strategy<Value = Rank> {
    prop::sample::select(Rank::ALL.to_vec())
}

/// A session with 1-4 players and up to 40 cards spread over every zone.
pub fn session() -> impl Strategy<Value = GameSession> {
    (
        1usize..=4,
        prop::collection::vec((0u8..4, suit(), rank(), any::<bool>()), 0..40),
    )
        .prop_map(|(player_count, cards)| {
            let mut session = GameSession::new("PROP01");
            for seat in 0..player_count {
                session.players.push(Player {
                    id: format!("p{seat}"),
                    name: format!("Player {seat}"),
                    position: seat,
                    cards: Vec::new(),
                });
            }

            let mut pending_group: Vec<Card> = Vec::new();
            for (i, (zone, suit, rank, face_up)) in cards.into_iter().enumerate() {
                let card = Card::new(format!("c{i}"), suit, rank, face_up);
                match zone {
                    0 => session.deck_cards.push(card),
                    1 => session.players[i % player_count].cards.push(card),
                    2 => session
                        .table_cards
                        .push(TableCard::new(card, i as f64, i as f64)),
                    _ => {
                        pending_group.push(card);
                        if pending_group.len() == 2 {
                            session.card_groups.push(CardGroup {
                                id: format!("g{i}"),
                                cards: std::mem::take(&mut pending_group),
                                x: 10.0,
                                y: 10.0,
                                mode: GroupMode::Fan,
                            });
                        }
                    }
                }
            }
            for card in pending_group {
                session.table_cards.push(TableCard::new(card, 0.0, 0.0));
            }
            session
        })
}

#[derive(Debug, Clone)]
pub enum TableOp {
    Move {
        card: usize,
        from: SourceZone,
        to: DestZone,
        player: usize,
        face_up: Option<bool>,
        at: Option<(f64, f64)>,
    },
    Group {
        first: usize,
        second: usize,
        at: (f64, f64),
    },
    AddToGroup {
        group: usize,
        card: usize,
    },
    Ungroup {
        group: usize,
        index: usize,
        at: Option<(f64, f64)>,
    },
    GroupToHand {
        group: usize,
        index: usize,
        player: usize,
    },
    Reorder {
        player: usize,
        from: usize,
        to: usize,
    },
    AddDeck,
    RemoveFromDeck(RemoveFromDeck),
}

fn removal() -> impl Strategy<Value = RemoveFromDeck> {
    (
        prop::collection::vec(suit(), 0..2),
        prop::collection::vec(rank(), 0..3),
        prop::collection::vec((suit(), rank()), 0..3),
    )
        .prop_map(|(suits, ranks, cards)| RemoveFromDeck {
            suits,
            ranks,
            cards: cards
                .into_iter()
                .map(|(suit, rank)| CardSpec { suit, rank })
                .collect(),
        })
}

fn coord() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..800.0, 0.0f64..600.0)
}

fn source() -> impl Strategy<Value = SourceZone> {
    prop_oneof![
        Just(SourceZone::Deck),
        Just(SourceZone::Hand),
        Just(SourceZone::Table)
    ]
}

fn dest() -> impl Strategy<Value = DestZone> {
    prop_oneof![Just(DestZone::Hand), Just(DestZone::Table)]
}

pub fn table_op() -> impl Strategy<Value = TableOp> {
    prop_oneof![
        4 => (any::<usize>(), source(), dest(), any::<usize>(), any::<Option<bool>>(), prop::option::weighted(0.9, coord()))
            .prop_map(|(card, from, to, player, face_up, at)| TableOp::Move { card, from, to, player, face_up, at }),
        2 => (any::<usize>(), any::<usize>(), coord())
            .prop_map(|(first, second, at)| TableOp::Group { first, second, at }),
        1 => (any::<usize>(), any::<usize>())
            .prop_map(|(group, card)| TableOp::AddToGroup { group, card }),
        1 => (any::<usize>(), 0usize..4, prop::option::of(coord()))
            .prop_map(|(group, index, at)| TableOp::Ungroup { group, index, at }),
        1 => (any::<usize>(), 0usize..4, any::<usize>())
            .prop_map(|(group, index, player)| TableOp::GroupToHand { group, index, player }),
        1 => (any::<usize>(), 0usize..6, 0usize..6)
            .prop_map(|(player, from, to)| TableOp::Reorder { player, from, to }),
        1 => Just(TableOp::AddDeck),
        1 => removal().prop_map(TableOp::RemoveFromDeck),
    ]
}

/// Resolve an index against `items`; one slot past the end maps to a stale id.
fn pick(items: Vec<String>, index: usize) -> String {
    let slots = items.len() + 1;
    items
        .get(index % slots)
        .cloned()
        .unwrap_or_else(|| STALE.to_string())
}

fn card_ref(session: &GameSession, index: usize) -> String {
    pick(session.card_ids().into_iter().cloned().collect(), index)
}

fn group_ref(session: &GameSession, index: usize) -> String {
    pick(session.card_groups.iter().map(|g| g.id.clone()).collect(), index)
}

fn player_ref(session: &GameSession, index: usize) -> String {
    pick(session.players.iter().map(|p| p.id.clone()).collect(), index)
}

pub fn apply_op(session: &mut GameSession, op: &TableOp) -> MoveOutcome {
    match *op {
        TableOp::AddDeck => {
            add_deck(session);
            MoveOutcome::Applied
        }
        TableOp::RemoveFromDeck(ref criteria) => {
            remove_from_deck(session, criteria);
            MoveOutcome::Applied
        }
        TableOp::Move {
            card,
            from,
            to,
            player,
            face_up,
            at,
        } => {
            let req = MoveCard {
                card_id: card_ref(session, card),
                from,
                to,
                to_player_id: Some(player_ref(session, player)),
                face_up,
                x: at.map(|(x, _)| x),
                y: at.map(|(_, y)| y),
            };
            move_card(session, &req)
        }
        TableOp::Group { first, second, at } => {
            let req = CreateGroup {
                card_ids: [card_ref(session, first), card_ref(session, second)],
                x: at.0,
                y: at.1,
                mode: GroupMode::Stack,
            };
            create_group(session, &req)
        }
        TableOp::AddToGroup { group, card } => {
            let group_id = group_ref(session, group);
            let card_id = card_ref(session, card);
            add_card_to_group(session, &group_id, &card_id)
        }
        TableOp::Ungroup { group, index, at } => {
            let group_id = group_ref(session, group);
            remove_card_from_group(session, &group_id, index, at)
        }
        TableOp::GroupToHand {
            group,
            index,
            player,
        } => {
            let group_id = group_ref(session, group);
            let player_id = player_ref(session, player);
            move_card_from_group_to_hand(session, &group_id, index, &player_id)
        }
        TableOp::Reorder { player, from, to } => {
            let player_id = player_ref(session, player);
            reorder_hand(session, &player_id, from, to)
        }
    }
}
