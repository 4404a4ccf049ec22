pub mod rooms;
pub mod sync;
pub mod table;

pub use rooms::{LeaveOutcome, RoomJoined, RoomService};
pub use sync::{SyncService, Synced};
pub use table::{MutationResult, TableService};
