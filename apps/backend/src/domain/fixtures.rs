//! Hand-built sessions for unit tests.

use crate::domain::session::{CardGroup, GameSession, GroupMode, Player, TableCard};
use crate::domain::{Card, Rank, Suit};

pub struct SessionFixture {
    session: GameSession,
    minted: usize,
}

impl SessionFixture {
    pub fn new() -> Self {
        let mut session = GameSession::new("TEST01");
        session.last_update = 0;
        Self { session, minted: 0 }
    }

    fn mint(&mut self, id: &str, face_up: bool) -> Card {
        let suit = Suit::ALL[self.minted % Suit::ALL.len()];
        let rank = Rank::ALL[self.minted % Rank::ALL.len()];
        self.minted += 1;
        Card::new(id, suit, rank, face_up)
    }

    pub fn with_players(mut self, ids: &[&str]) -> Self {
        for id in ids {
            let position = self.session.players.len();
            self.session.players.push(Player {
                id: id.to_string(),
                name: format!("name-{id}"),
                position,
                cards: Vec::new(),
            });
        }
        self
    }

    /// Deck listed bottom to top.
    pub fn with_deck(mut self, ids: &[&str]) -> Self {
        for id in ids {
            let card = self.mint(id, false);
            self.session.deck_cards.push(card);
        }
        self
    }

    pub fn with_hand_card(mut self, player_id: &str, card_id: &str) -> Self {
        let card = self.mint(card_id, true);
        self.session
            .player_mut(player_id)
            .expect("fixture player must exist")
            .cards
            .push(card);
        self
    }

    pub fn with_table_card(self, card_id: &str) -> Self {
        self.with_table_card_at(card_id, 0.0, 0.0, false)
    }

    pub fn with_table_card_at(mut self, card_id: &str, x: f64, y: f64, face_up: bool) -> Self {
        let card = self.mint(card_id, face_up);
        self.session.table_cards.push(TableCard::new(card, x, y));
        self
    }

    pub fn with_group(mut self, group_id: &str, card_ids: &[&str]) -> Self {
        let cards = card_ids.iter().map(|id| self.mint(id, true)).collect();
        self.session.card_groups.push(CardGroup {
            id: group_id.to_string(),
            cards,
            x: 100.0,
            y: 200.0,
            mode: GroupMode::Fan,
        });
        self
    }

    pub fn build(self) -> GameSession {
        self.session
    }

    pub fn build_with_deck(mut self, deck: Vec<Card>) -> GameSession {
        self.session.deck_cards = deck;
        self.session
    }
}

impl Default for SessionFixture {
    fn default() -> Self {
        Self::new()
    }
}
