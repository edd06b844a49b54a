//! focuscoach-core — Diagnostic scoring, mastery policy, content pipeline,
//! and the learner session state machine.
//!
//! This crate defines the data model, collaborator traits, and the pure
//! policies the rest of focuscoach builds on. Generators and stores are
//! supplied by `focuscoach-providers` and `focuscoach-store`.

pub mod curriculum;
pub mod error;
pub mod mastery;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod sanitizer;
pub mod scoring;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ContentError, DecodeError, PersistenceError, ProviderError, SessionError};
pub use mastery::{Mastery, Tier};
