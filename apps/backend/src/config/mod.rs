pub mod db;
pub mod rooms;
pub mod store;
pub mod sync;
