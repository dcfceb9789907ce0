//! Chat front end: welcome screen plus conversation history.
//!
//! The session is a small state machine (`Welcome ⇄ Chat`) fed by
//! `ChatEvent`s. Both the HTTP/WebSocket surface and the terminal REPL drive
//! the same session type.

pub mod session;
pub mod state;

pub use session::{ChatSession, SessionSnapshot};
pub use state::{ChatEvent, ConversationTurn, Role, Screen};
