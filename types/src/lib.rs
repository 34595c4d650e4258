//! Canonical consensus-message model for the anuvad engine.
//!
//! PBFT/HotStuff-family node implementations disagree on message-type
//! vocabulary, field names, and wire encodings. This crate defines the one
//! in-memory representation everything converts to and from:
//!
//! - [`Phase`]: the normalized message phase, open to unrecognized tokens
//! - [`AbstractMessage`]: the canonical message with strongly-typed fields
//!   plus an open-extension bag for fields the model does not know
//! - [`ViewChangeEntry`]: nested per-validator view-change records
//!
//! ## Design Goals
//!
//! These are **pure data types**: no wire format knowledge lives here. The
//! codec crate owns parsing and serialization; applications can hold and
//! compare `AbstractMessage` values without pulling in any codec machinery.

pub mod message;
pub mod phase;

pub use message::{AbstractMessage, CompareProfile, ViewChangeEntry};
pub use phase::Phase;
