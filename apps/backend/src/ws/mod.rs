pub mod broker;
pub mod protocol;
pub mod session;

pub use session::upgrade;
