//! Infrastructure: database bootstrap, DB error mapping and state assembly.

pub mod db;
pub mod db_errors;
pub mod state;
