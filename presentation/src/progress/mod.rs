//! Terminal progress for chat sessions

pub mod reporter;
