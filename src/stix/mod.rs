//! STIX 2.1 translation layer.
//!
//! [`produce`] turns platform indicator records into STIX Indicator objects
//! with deterministic ids; [`consume_mappings`] walks a STIX pattern and
//! classifies its observations back into platform indicator mappings.

pub mod consume;
pub mod produce;
pub mod registry;

#[cfg(test)]
mod tests;

pub use consume::{consume_mappings, mappings_from_pattern};
pub use produce::{produce, produce_bundle, produce_json, produce_one};
