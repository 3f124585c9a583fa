//! Client side of the real-time channel: a connection handle and the
//! editor state machine built on top of it.

pub mod editor;
pub mod session;

pub use editor::{EditorController, EditorEvent, EditorState};
pub use session::{ClientError, ClientSession, RoomSubscription};
