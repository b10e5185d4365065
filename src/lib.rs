//! Bidirectional STIX 2.1 indicator translation for threat intelligence
//! platforms.
//!
//! This crate provides:
//! - A STIX 2.1 pattern grammar: tokenizer, recursive-descent parser, and a
//!   listener-driven tree walk
//! - A produce translator turning platform-native indicator records into
//!   STIX Indicator objects with deterministic, re-identifiable ids
//! - A consume classifier turning STIX patterns back into platform-native
//!   indicator mappings
//! - A static type-detail registry of per-type pattern builders and the
//!   marking / threat-rating vocabularies
//!
//! The crate performs no I/O: callers hand in JSON-shaped records or raw
//! pattern text and receive fully assembled values back.

pub mod error;
pub mod pattern;
pub mod stix;
pub mod types;

// Re-export key types at crate root for convenience.
pub use error::{Result, StixError};
pub use pattern::{Observation, ObservationExtractor, Pattern, PatternError, PatternListener};
pub use stix::{consume_mappings, mappings_from_pattern, produce, produce_bundle, produce_json};
pub use types::*;
