pub mod auth_user;
pub mod diagnostics;
pub mod entry;
pub mod error;
pub mod health;
pub mod messages;

pub use auth_user::*;
pub use diagnostics::*;
pub use entry::*;
pub use error::*;
pub use health::*;
pub use messages::*;
