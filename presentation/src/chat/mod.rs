//! Interactive chat module
//!
//! A reedline-based REPL on top of a multi-turn [`ChatSession`].

mod repl;
mod session;

pub use repl::{ChatRepl, ReplCommand};
pub use session::{ChatBackend, ChatSession};
