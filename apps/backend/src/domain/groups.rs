//! Card groups: stacks or fans of cards sharing one table position.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::moves::{MoveOutcome, StaleReason};
use crate::domain::session::{CardGroup, GameSession, GroupMode, TableCard};
use crate::domain::zones::{locate_card, take_card, CardLocation, Zone};
use crate::domain::Card;

/// Offset applied to a card pulled out of a group without an explicit drop point.
pub const UNGROUP_OFFSET: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub card_ids: [String; 2],
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub mode: GroupMode,
}

/// Pull a card out of whichever zone may feed a group. A deck card qualifies
/// only if it is `deck_top`, the top when the gesture started, and is turned
/// face-up; cards already grouped do not qualify.
fn take_groupable(
    session: &mut GameSession,
    card_id: &str,
    deck_top: Option<&str>,
) -> Result<Card, StaleReason> {
    let loc = locate_card(session, card_id).ok_or(StaleReason::CardNotFound)?;
    let from_deck = match &loc.zone {
        Zone::Table | Zone::Hand(_) => false,
        Zone::Deck if deck_top == Some(card_id) => true,
        Zone::Deck => return Err(StaleReason::CardNotFound),
        Zone::Group(_) => return Err(StaleReason::AlreadyInGroup),
    };
    let card = take_card(session, &loc).ok_or(StaleReason::CardNotFound)?;
    Ok(if from_deck { card.with_face(true) } else { card })
}

/// Stack two cards into a new group at `(x, y)`.
///
/// When only one of the two cards can still be found it is laid loose on
/// the table at the drop point instead; single-card groups are never made.
pub fn create_group(session: &mut GameSession, req: &CreateGroup) -> MoveOutcome {
    if req.card_ids[0] == req.card_ids[1] {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    }
    let deck_top = session.deck_cards.last().map(|c| c.id.clone());
    let mut cards = Vec::with_capacity(2);
    for card_id in &req.card_ids {
        if let Ok(card) = take_groupable(session, card_id, deck_top.as_deref()) {
            cards.push(card);
        }
    }
    match cards.len() {
        0 => MoveOutcome::NoOp(StaleReason::CardNotFound),
        1 => {
            if let Some(card) = cards.pop() {
                session.table_cards.push(TableCard::new(card, req.x, req.y));
            }
            MoveOutcome::Applied
        }
        _ => {
            session.card_groups.push(CardGroup {
                id: Uuid::new_v4().to_string(),
                cards,
                x: req.x,
                y: req.y,
                mode: req.mode,
            });
            MoveOutcome::Applied
        }
    }
}

pub fn add_card_to_group(session: &mut GameSession, group_id: &str, card_id: &str) -> MoveOutcome {
    if !session.card_groups.iter().any(|g| g.id == group_id) {
        return MoveOutcome::NoOp(StaleReason::GroupNotFound);
    }
    let deck_top = session.deck_cards.last().map(|c| c.id.clone());
    let card = match take_groupable(session, card_id, deck_top.as_deref()) {
        Ok(card) => card,
        Err(reason) => return MoveOutcome::NoOp(reason),
    };
    match session.group_mut(group_id) {
        Some(group) => {
            group.cards.push(card);
            MoveOutcome::Applied
        }
        // Taking from table, hand or deck never removes a group; keep the card anyway.
        None => {
            session.table_cards.push(TableCard::new(card, 0.0, 0.0));
            MoveOutcome::NoOp(StaleReason::GroupNotFound)
        }
    }
}

/// Pull the member at `index` back onto the table. Without a drop point the
/// card lands offset from the group's position.
pub fn remove_card_from_group(
    session: &mut GameSession,
    group_id: &str,
    index: usize,
    drop_at: Option<(f64, f64)>,
) -> MoveOutcome {
    let Some(group) = session.card_groups.iter().find(|g| g.id == group_id) else {
        return MoveOutcome::NoOp(StaleReason::GroupNotFound);
    };
    if index >= group.cards.len() {
        return MoveOutcome::NoOp(StaleReason::IndexOutOfRange);
    }
    let (x, y) = drop_at.unwrap_or((group.x + UNGROUP_OFFSET, group.y + UNGROUP_OFFSET));
    let loc = CardLocation {
        zone: Zone::Group(group_id.to_string()),
        index,
    };
    let Some(card) = take_card(session, &loc) else {
        return MoveOutcome::NoOp(StaleReason::IndexOutOfRange);
    };
    session.table_cards.push(TableCard::new(card, x, y));
    MoveOutcome::Applied
}

/// Move the member at `index` into a player's hand, face-up.
pub fn move_card_from_group_to_hand(
    session: &mut GameSession,
    group_id: &str,
    index: usize,
    player_id: &str,
) -> MoveOutcome {
    let Some(group) = session.card_groups.iter().find(|g| g.id == group_id) else {
        return MoveOutcome::NoOp(StaleReason::GroupNotFound);
    };
    if index >= group.cards.len() {
        return MoveOutcome::NoOp(StaleReason::IndexOutOfRange);
    }
    if session.player(player_id).is_none() {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    }
    let loc = CardLocation {
        zone: Zone::Group(group_id.to_string()),
        index,
    };
    let Some(card) = take_card(session, &loc) else {
        return MoveOutcome::NoOp(StaleReason::IndexOutOfRange);
    };
    if let Some(player) = session.player_mut(player_id) {
        player.cards.push(card.with_face(true));
    }
    MoveOutcome::Applied
}

pub fn move_group(session: &mut GameSession, group_id: &str, x: f64, y: f64) -> MoveOutcome {
    match session.group_mut(group_id) {
        Some(group) => {
            group.x = x;
            group.y = y;
            MoveOutcome::Applied
        }
        None => MoveOutcome::NoOp(StaleReason::GroupNotFound),
    }
}

pub fn set_group_mode(session: &mut GameSession, group_id: &str, mode: GroupMode) -> MoveOutcome {
    match session.group_mut(group_id) {
        Some(group) => {
            group.mode = mode;
            MoveOutcome::Applied
        }
        None => MoveOutcome::NoOp(StaleReason::GroupNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::SessionFixture;
    use crate::domain::zones::card_census;

    fn create(ids: [&str; 2]) -> CreateGroup {
        CreateGroup {
            card_ids: [ids[0].to_string(), ids[1].to_string()],
            x: 100.0,
            y: 200.0,
            mode: GroupMode::Stack,
        }
    }

    #[test]
    fn two_table_cards_form_a_group() {
        let mut s = SessionFixture::new()
            .with_table_card("a")
            .with_table_card("b")
            .build();
        let census = card_census(&s);

        assert!(create_group(&mut s, &create(["a", "b"])).is_applied());

        assert!(s.table_cards.is_empty());
        assert_eq!(s.card_groups.len(), 1);
        let group = &s.card_groups[0];
        assert_eq!(group.cards.len(), 2);
        assert_eq!((group.x, group.y), (100.0, 200.0));
        assert_eq!(group.mode, GroupMode::Stack);
        assert_eq!(card_census(&s), census);
    }

    #[test]
    fn deck_top_joins_group_face_up() {
        let mut s = SessionFixture::new()
            .with_deck(&["bottom", "top"])
            .with_table_card("t")
            .build();
        assert!(create_group(&mut s, &create(["t", "top"])).is_applied());
        let group = &s.card_groups[0];
        let top = group.cards.iter().find(|c| c.id == "top").unwrap();
        assert!(top.face_up);
        assert_eq!(s.deck_cards.len(), 1);
    }

    #[test]
    fn only_the_starting_deck_top_joins_a_group() {
        let mut s = SessionFixture::new()
            .with_deck(&["bottom", "second", "top"])
            .build();

        assert!(create_group(&mut s, &create(["top", "second"])).is_applied());

        assert!(s.card_groups.is_empty());
        assert_eq!(s.table_cards.len(), 1);
        assert_eq!(s.table_cards[0].card.id, "top");
        assert!(s.table_cards[0].card.face_up);
        let deck: Vec<_> = s.deck_cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(deck, ["bottom", "second"]);
    }

    #[test]
    fn deck_card_below_top_is_not_groupable() {
        let mut s = SessionFixture::new()
            .with_deck(&["bottom", "top"])
            .with_table_card("t")
            .build();
        create_group(&mut s, &create(["t", "bottom"]));
        assert!(s.card_groups.is_empty());
        assert_eq!(s.deck_cards.len(), 2);
        assert_eq!(s.table_cards.len(), 1);
        assert_eq!((s.table_cards[0].x, s.table_cards[0].y), (100.0, 200.0));
    }

    #[test]
    fn zero_found_cards_do_nothing() {
        let mut s = SessionFixture::new().with_table_card("a").build();
        let before = s.clone();
        assert_eq!(
            create_group(&mut s, &create(["x", "y"])),
            MoveOutcome::NoOp(StaleReason::CardNotFound)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn add_card_appends_to_group() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_group("g", &["a", "b"])
            .with_hand_card("p1", "h")
            .build();
        assert!(add_card_to_group(&mut s, "g", "h").is_applied());
        assert_eq!(s.card_groups[0].cards.len(), 3);
        assert!(s.players[0].cards.is_empty());
    }

    #[test]
    fn add_grouped_card_is_rejected() {
        let mut s = SessionFixture::new()
            .with_group("g1", &["a", "b"])
            .with_group("g2", &["c", "d"])
            .build();
        let before = s.clone();
        assert_eq!(
            add_card_to_group(&mut s, "g1", "c"),
            MoveOutcome::NoOp(StaleReason::AlreadyInGroup)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn add_to_missing_group_is_noop() {
        let mut s = SessionFixture::new().with_table_card("a").build();
        assert_eq!(
            add_card_to_group(&mut s, "nope", "a"),
            MoveOutcome::NoOp(StaleReason::GroupNotFound)
        );
        assert_eq!(s.table_cards.len(), 1);
    }

    #[test]
    fn removing_last_member_dissolves_group() {
        let mut s = SessionFixture::new().with_group("g", &["a", "b"]).build();

        assert!(remove_card_from_group(&mut s, "g", 0, None).is_applied());
        assert_eq!(s.card_groups.len(), 1);
        assert_eq!(s.table_cards[0].id(), "a");
        assert_eq!((s.table_cards[0].x, s.table_cards[0].y), (120.0, 220.0));

        assert!(remove_card_from_group(&mut s, "g", 0, Some((5.0, 6.0))).is_applied());
        assert!(s.card_groups.is_empty());
        assert_eq!(s.table_cards.len(), 2);
        assert_eq!((s.table_cards[1].x, s.table_cards[1].y), (5.0, 6.0));
    }

    #[test]
    fn remove_out_of_range_index_is_noop() {
        let mut s = SessionFixture::new().with_group("g", &["a", "b"]).build();
        let before = s.clone();
        assert_eq!(
            remove_card_from_group(&mut s, "g", 2, None),
            MoveOutcome::NoOp(StaleReason::IndexOutOfRange)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn group_to_hand_turns_card_face_up() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_group("g", &["a", "b"])
            .build();
        s.card_groups[0].cards[1].face_up = false;

        assert!(move_card_from_group_to_hand(&mut s, "g", 1, "p1").is_applied());
        assert_eq!(s.players[0].cards[0].id, "b");
        assert!(s.players[0].cards[0].face_up);

        assert!(move_card_from_group_to_hand(&mut s, "g", 0, "p1").is_applied());
        assert!(s.card_groups.is_empty());
    }

    #[test]
    fn group_to_unknown_player_is_noop() {
        let mut s = SessionFixture::new().with_group("g", &["a", "b"]).build();
        let before = s.clone();
        assert_eq!(
            move_card_from_group_to_hand(&mut s, "g", 0, "ghost"),
            MoveOutcome::NoOp(StaleReason::PlayerNotFound)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn move_and_restyle_group() {
        let mut s = SessionFixture::new().with_group("g", &["a", "b"]).build();
        assert!(move_group(&mut s, "g", 1.0, 2.0).is_applied());
        assert!(set_group_mode(&mut s, "g", GroupMode::Stack).is_applied());
        assert_eq!((s.card_groups[0].x, s.card_groups[0].y), (1.0, 2.0));
        assert_eq!(s.card_groups[0].mode, GroupMode::Stack);
        assert_eq!(
            move_group(&mut s, "missing", 0.0, 0.0),
            MoveOutcome::NoOp(StaleReason::GroupNotFound)
        );
    }
}
