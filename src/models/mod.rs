//! Domain models for AlmostMe.
//!
//! # Core Concepts
//!
//! ## Static knowledge (loaded once, read-only)
//!
//! - [`Manual`]: A reference document the assistant may surface verbatim as a card.
//!   The loaded catalogue is closed: nothing outside it is ever offered.
//! - [`Domain`]: A named, prioritised block of authorized background text that is
//!   injected into the model's context.
//!
//! ## Per-visitor state
//!
//! - [`Session`]: Holds the [`History`] window plus the manuals already shown.
//!   Expires after a period of inactivity.
//! - [`History`]: Bounded, ordered list of [`Message`]s used as model context.
//!
//! ## Wire types
//!
//! - [`ChatRequest`] / [`ChatReply`]: the `POST /chat` payloads.

mod domain;
mod history;
mod manual;
mod message;
mod reply;
mod session;

pub use domain::*;
pub use history::*;
pub use manual::*;
pub use message::*;
pub use reply::*;
pub use session::*;
