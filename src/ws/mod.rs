pub mod connctx;
pub mod hub;
pub mod room;
pub mod typing;

pub use connctx::ConnId;
pub use hub::{Hub, HubError, HubStats};
