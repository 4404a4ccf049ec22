//! Domain layer: the card table model and every pure operation on it.
//!
//! Nothing here performs I/O. Services load a [`session::GameSession`], run
//! one of these functions against it and persist the result.

pub mod cards_serde;
pub mod cards_types;
pub mod deck;
pub mod groups;
pub mod moves;
pub mod player_view;
pub mod session;
pub mod table_ops;
pub mod zones;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod test_gens;
#[cfg(test)]
mod test_prelude;
#[cfg(test)]
mod tests_props_closed_world;

pub use cards_types::{Card, CardId, Rank, Suit};
pub use moves::{MoveOutcome, StaleReason};
pub use session::GameSession;
