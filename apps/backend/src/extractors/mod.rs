pub mod room_code;
pub mod validated_json;

pub use room_code::{RoomCode, ViewerQuery};
pub use validated_json::ValidatedJson;
