//! Chatter — passive chat corpus collection and Markov reply generation.
//!
//! Ordinary chat lines are filtered and stored in a deduplicated corpus.
//! When the bot is addressed in a scope where it has been switched on, a
//! small Markov chain is built from a random sample of that corpus and used
//! to produce a short reply.

pub mod core;
pub mod schema;

pub use crate::core::pipeline::{Chatbot, ChatError, LineOutcome, ReplySink, ToggleOutcome};
pub use crate::schema::line::ChatLine;
pub use crate::schema::status::CorpusStatus;
