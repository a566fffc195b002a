//! AlmostMe: a personal-assistant chat backend.
//!
//! Incoming messages are first checked against a local rule table
//! ([`router`]) that can answer directly (manual cards, manual lists,
//! refusals). Everything else goes to a hosted model ([`llm`]) together with
//! curated knowledge ([`knowledge`]) and a bounded history window kept in a
//! server-side [`session`].

pub mod api;
pub mod chat;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod router;
pub mod session;
