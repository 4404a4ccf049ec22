//! Zone-to-zone card moves.
//!
//! Each move locates the card, removes it from exactly that place and
//! appends it to exactly one destination. A request whose references no
//! longer hold leaves the session untouched and reports `NoOp`.

use serde::{Deserialize, Serialize};

use crate::domain::session::{GameSession, TableCard};
use crate::domain::zones::{locate_card, take_card, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceZone {
    Deck,
    Hand,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestZone {
    Hand,
    Table,
}

/// A move request as the table UI emits it. For deck sources `card_id` is
/// ignored and the top card is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCard {
    pub card_id: String,
    pub from: SourceZone,
    pub to: DestZone,
    #[serde(default)]
    pub to_player_id: Option<String>,
    #[serde(default)]
    pub face_up: Option<bool>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

/// Why a request was dropped without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    CardNotFound,
    PlayerNotFound,
    GroupNotFound,
    MissingPosition,
    SameHand,
    IndexOutOfRange,
    AlreadyInGroup,
}

impl StaleReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            StaleReason::CardNotFound => "card_not_found",
            StaleReason::PlayerNotFound => "player_not_found",
            StaleReason::GroupNotFound => "group_not_found",
            StaleReason::MissingPosition => "missing_position",
            StaleReason::SameHand => "same_hand",
            StaleReason::IndexOutOfRange => "index_out_of_range",
            StaleReason::AlreadyInGroup => "already_in_group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    NoOp(StaleReason),
    DeckEmpty,
}

impl MoveOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, MoveOutcome::Applied)
    }
}

fn position(req: &MoveCard) -> Option<(f64, f64)> {
    Some((req.x?, req.y?))
}

pub fn move_card(session: &mut GameSession, req: &MoveCard) -> MoveOutcome {
    match (req.from, req.to) {
        (SourceZone::Deck, DestZone::Table) => deck_to_table(session, req),
        (SourceZone::Deck, DestZone::Hand) => deck_to_hand(session, req),
        (SourceZone::Hand, DestZone::Table) => hand_to_table(session, req),
        (SourceZone::Table, DestZone::Hand) => table_to_hand(session, req),
        (SourceZone::Table, DestZone::Table) => table_to_table(session, req),
        (SourceZone::Hand, DestZone::Hand) => hand_to_hand(session, req),
    }
}

fn deck_to_table(session: &mut GameSession, req: &MoveCard) -> MoveOutcome {
    if session.deck_cards.is_empty() {
        return MoveOutcome::DeckEmpty;
    }
    let Some((x, y)) = position(req) else {
        return MoveOutcome::NoOp(StaleReason::MissingPosition);
    };
    let Some(card) = session.deck_cards.pop() else {
        return MoveOutcome::DeckEmpty;
    };
    let card = card.with_face(req.face_up.unwrap_or(false));
    session.table_cards.push(TableCard::new(card, x, y));
    MoveOutcome::Applied
}

fn deck_to_hand(session: &mut GameSession, req: &MoveCard) -> MoveOutcome {
    if session.deck_cards.is_empty() {
        return MoveOutcome::DeckEmpty;
    }
    let Some(target) = req.to_player_id.as_deref() else {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    };
    if session.player(target).is_none() {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    }
    let Some(card) = session.deck_cards.pop() else {
        return MoveOutcome::DeckEmpty;
    };
    let card = card.with_face(req.face_up.unwrap_or(true));
    if let Some(player) = session.player_mut(target) {
        player.cards.push(card);
    }
    MoveOutcome::Applied
}

fn hand_to_table(session: &mut GameSession, req: &MoveCard) -> MoveOutcome {
    let Some((x, y)) = position(req) else {
        return MoveOutcome::NoOp(StaleReason::MissingPosition);
    };
    let Some(loc) = locate_card(session, &req.card_id) else {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    };
    if !matches!(loc.zone, Zone::Hand(_)) {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    }
    let Some(card) = take_card(session, &loc) else {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    };
    let card = card.with_face(req.face_up.unwrap_or(false));
    session.table_cards.push(TableCard::new(card, x, y));
    MoveOutcome::Applied
}

fn table_to_hand(session: &mut GameSession, req: &MoveCard) -> MoveOutcome {
    let Some(target) = req.to_player_id.as_deref() else {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    };
    if session.player(target).is_none() {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    }
    let Some(loc) = locate_card(session, &req.card_id).filter(|l| l.zone == Zone::Table) else {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    };
    let Some(card) = take_card(session, &loc) else {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    };
    let card = card.with_face(req.face_up.unwrap_or(true));
    if let Some(player) = session.player_mut(target) {
        player.cards.push(card);
    }
    MoveOutcome::Applied
}

fn table_to_table(session: &mut GameSession, req: &MoveCard) -> MoveOutcome {
    let Some((x, y)) = position(req) else {
        return MoveOutcome::NoOp(StaleReason::MissingPosition);
    };
    let Some(table_card) = session
        .table_cards
        .iter_mut()
        .find(|t| t.card.id == req.card_id)
    else {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    };
    table_card.x = x;
    table_card.y = y;
    if let Some(face_up) = req.face_up {
        table_card.card.face_up = face_up;
    }
    MoveOutcome::Applied
}

fn hand_to_hand(session: &mut GameSession, req: &MoveCard) -> MoveOutcome {
    let Some(target) = req.to_player_id.as_deref() else {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    };
    if session.player(target).is_none() {
        return MoveOutcome::NoOp(StaleReason::PlayerNotFound);
    }
    let Some(loc) = locate_card(session, &req.card_id) else {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    };
    match &loc.zone {
        Zone::Hand(owner) if owner == target => return MoveOutcome::NoOp(StaleReason::SameHand),
        Zone::Hand(_) => {}
        _ => return MoveOutcome::NoOp(StaleReason::CardNotFound),
    }
    let Some(card) = take_card(session, &loc) else {
        return MoveOutcome::NoOp(StaleReason::CardNotFound);
    };
    let card = card.with_face(req.face_up.unwrap_or(true));
    if let Some(player) = session.player_mut(target) {
        player.cards.push(card);
    }
    MoveOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::SessionFixture;
    use crate::domain::zones::card_census;

    fn req(card_id: &str, from: SourceZone, to: DestZone) -> MoveCard {
        MoveCard {
            card_id: card_id.to_string(),
            from,
            to,
            to_player_id: None,
            face_up: None,
            x: None,
            y: None,
        }
    }

    fn at(mut r: MoveCard, x: f64, y: f64) -> MoveCard {
        r.x = Some(x);
        r.y = Some(y);
        r
    }

    fn to_player(mut r: MoveCard, player: &str) -> MoveCard {
        r.to_player_id = Some(player.to_string());
        r
    }

    #[test]
    fn deck_to_table_places_top_card_face_down() {
        let mut s = SessionFixture::new().with_deck(&["a", "b", "top"]).build();
        let outcome = move_card(&mut s, &at(req("top-card", SourceZone::Deck, DestZone::Table), 5.0, 6.0));
        assert_eq!(outcome, MoveOutcome::Applied);
        assert_eq!(s.deck_cards.len(), 2);
        let placed = &s.table_cards[0];
        assert_eq!(placed.id(), "top");
        assert!(!placed.card.face_up);
        assert_eq!((placed.x, placed.y), (5.0, 6.0));
    }

    #[test]
    fn deck_to_hand_defaults_face_up() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_deck(&["a", "top"])
            .build();
        let outcome = move_card(&mut s, &to_player(req("top-card", SourceZone::Deck, DestZone::Hand), "p1"));
        assert!(outcome.is_applied());
        assert_eq!(s.players[0].cards[0].id, "top");
        assert!(s.players[0].cards[0].face_up);
    }

    #[test]
    fn deck_move_on_empty_deck_reports_exhaustion() {
        let mut s = SessionFixture::new().with_players(&["p1"]).build();
        let before = s.clone();
        let outcome = move_card(&mut s, &to_player(req("top-card", SourceZone::Deck, DestZone::Hand), "p1"));
        assert_eq!(outcome, MoveOutcome::DeckEmpty);
        assert_eq!(s, before);
    }

    #[test]
    fn hand_to_table_defaults_face_down() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_hand_card("p1", "c1")
            .build();
        let outcome = move_card(&mut s, &at(req("c1", SourceZone::Hand, DestZone::Table), 100.0, 50.0));
        assert!(outcome.is_applied());
        assert!(s.players[0].cards.is_empty());
        assert_eq!(s.table_cards[0].id(), "c1");
        assert!(!s.table_cards[0].card.face_up);
    }

    #[test]
    fn explicit_face_overrides_default() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_hand_card("p1", "c1")
            .build();
        let mut r = at(req("c1", SourceZone::Hand, DestZone::Table), 1.0, 1.0);
        r.face_up = Some(true);
        move_card(&mut s, &r);
        assert!(s.table_cards[0].card.face_up);
    }

    #[test]
    fn table_to_hand_defaults_face_up() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_table_card("c1")
            .build();
        let outcome = move_card(&mut s, &to_player(req("c1", SourceZone::Table, DestZone::Hand), "p1"));
        assert!(outcome.is_applied());
        assert!(s.table_cards.is_empty());
        assert!(s.players[0].cards[0].face_up);
    }

    #[test]
    fn table_to_missing_player_keeps_card_on_table() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_table_card("c1")
            .build();
        let before = s.clone();
        let outcome = move_card(&mut s, &to_player(req("c1", SourceZone::Table, DestZone::Hand), "ghost"));
        assert_eq!(outcome, MoveOutcome::NoOp(StaleReason::PlayerNotFound));
        assert_eq!(s, before);
    }

    #[test]
    fn table_to_table_repositions_and_keeps_face() {
        let mut s = SessionFixture::new()
            .with_table_card_at("c1", 0.0, 0.0, true)
            .build();
        let outcome = move_card(&mut s, &at(req("c1", SourceZone::Table, DestZone::Table), 30.0, 40.0));
        assert!(outcome.is_applied());
        assert_eq!(s.table_cards.len(), 1);
        assert_eq!((s.table_cards[0].x, s.table_cards[0].y), (30.0, 40.0));
        assert!(s.table_cards[0].card.face_up);
    }

    #[test]
    fn table_to_table_can_flip() {
        let mut s = SessionFixture::new()
            .with_table_card_at("c1", 0.0, 0.0, true)
            .build();
        let mut r = at(req("c1", SourceZone::Table, DestZone::Table), 0.0, 0.0);
        r.face_up = Some(false);
        move_card(&mut s, &r);
        assert!(!s.table_cards[0].card.face_up);
    }

    #[test]
    fn hand_to_hand_transfers_between_players() {
        let mut s = SessionFixture::new()
            .with_players(&["p1", "p2"])
            .with_hand_card("p1", "c1")
            .build();
        let outcome = move_card(&mut s, &to_player(req("c1", SourceZone::Hand, DestZone::Hand), "p2"));
        assert!(outcome.is_applied());
        assert!(s.players[0].cards.is_empty());
        assert_eq!(s.players[1].cards[0].id, "c1");
    }

    #[test]
    fn hand_to_same_hand_is_a_noop() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_hand_card("p1", "c1")
            .build();
        let before = s.clone();
        let outcome = move_card(&mut s, &to_player(req("c1", SourceZone::Hand, DestZone::Hand), "p1"));
        assert_eq!(outcome, MoveOutcome::NoOp(StaleReason::SameHand));
        assert_eq!(s, before);
    }

    #[test]
    fn stale_card_reference_changes_nothing() {
        let mut s = SessionFixture::new()
            .with_players(&["p1"])
            .with_deck(&["d1"])
            .with_table_card("t1")
            .build();
        let before = s.clone();
        let outcome = move_card(&mut s, &to_player(req("gone", SourceZone::Table, DestZone::Hand), "p1"));
        assert_eq!(outcome, MoveOutcome::NoOp(StaleReason::CardNotFound));
        assert_eq!(s, before);
    }

    #[test]
    fn hand_source_rejects_table_card() {
        let mut s = SessionFixture::new().with_table_card("t1").build();
        let outcome = move_card(&mut s, &at(req("t1", SourceZone::Hand, DestZone::Table), 1.0, 1.0));
        assert_eq!(outcome, MoveOutcome::NoOp(StaleReason::CardNotFound));
    }

    #[test]
    fn missing_coordinates_are_a_noop() {
        let mut s = SessionFixture::new().with_deck(&["a"]).build();
        let outcome = move_card(&mut s, &req("top-card", SourceZone::Deck, DestZone::Table));
        assert_eq!(outcome, MoveOutcome::NoOp(StaleReason::MissingPosition));
        assert_eq!(s.deck_cards.len(), 1);
    }

    #[test]
    fn hand_to_table_to_hand_preserves_census() {
        let mut s = SessionFixture::new()
            .with_players(&["p1", "p2"])
            .with_hand_card("p1", "c1")
            .with_deck(&["d1", "d2"])
            .build();
        let census = card_census(&s);

        move_card(&mut s, &at(req("c1", SourceZone::Hand, DestZone::Table), 100.0, 50.0));
        move_card(&mut s, &to_player(req("c1", SourceZone::Table, DestZone::Hand), "p2"));

        assert_eq!(card_census(&s), census);
        assert_eq!(s.players[1].cards[0].id, "c1");
        assert!(s.players[1].cards[0].face_up);
    }

    #[test]
    fn move_request_parses_from_camel_case() {
        let r: MoveCard = serde_json::from_str(
            r#"{"cardId":"c1","from":"hand","to":"table","x":1.5,"y":2}"#,
        )
        .unwrap();
        assert_eq!(r.from, SourceZone::Hand);
        assert_eq!(r.to, DestZone::Table);
        assert_eq!(r.x, Some(1.5));
        assert_eq!(r.to_player_id, None);
    }
}
