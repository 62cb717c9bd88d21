//! Conversation orchestration for the link catalog bot.
//!
//! This crate ties extraction, category selection and catalog persistence
//! into the per-conversation flow driven by [`Controller`].

pub mod category;
pub mod command;
pub mod conversation;
pub mod replies;
pub mod session;

pub use conversation::{Controller, first_url};
pub use replies::{Reply, ReplyMarkup, ReplySink};
pub use session::{InMemorySessionStore, SessionStore};
