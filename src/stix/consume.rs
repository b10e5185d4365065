//! Consume classifier: STIX 2.1 patterns to platform indicator mappings.
//!
//! The pattern is walked once to extract its observation pairs; the default,
//! IP, and file handlers then each scan the full pair list and their outputs
//! are concatenated in that fixed order. Handlers are pure functions, so
//! classifying the same pattern twice yields identical output.

use serde_json::Value;

use crate::error::{Result, StixError};
use crate::pattern::{Observation, ObservationExtractor, Pattern};
use crate::types::IndicatorMapping;

/// Path vocabulary handled by the default classifier.
const DEFAULT_TYPE_MAP: &[(&str, &str)] = &[
    ("url:value", "URL"),
    ("email-addr:value", "EmailAddress"),
    ("domain-name:value", "Host"),
    ("autonomous-system:name", "ASN"),
];

/// Produce platform indicator mappings from a STIX object's `pattern` field.
pub fn consume_mappings(stix_data: &Value) -> Result<Vec<IndicatorMapping>> {
    let pattern = stix_data
        .get("pattern")
        .and_then(Value::as_str)
        .ok_or(StixError::MissingPattern)?;
    mappings_from_pattern(pattern)
}

/// Produce platform indicator mappings from a raw STIX pattern string.
pub fn mappings_from_pattern(pattern: &str) -> Result<Vec<IndicatorMapping>> {
    let parsed = Pattern::parse(pattern)?;
    let mut extractor = ObservationExtractor::new();
    parsed.walk(&mut extractor);
    let observations = extractor.into_observations();

    let mut mappings = default_handler(&observations);
    mappings.extend(ip_handler(&observations));
    mappings.extend(file_handler(&observations));
    Ok(mappings)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// URL / EmailAddress / Host / ASN observations, one mapping per pair.
fn default_handler(observations: &[Observation]) -> Vec<IndicatorMapping> {
    observations
        .iter()
        .filter_map(|obs| {
            DEFAULT_TYPE_MAP
                .iter()
                .find(|(path, _)| *path == obs.path)
                .map(|(_, indicator_type)| {
                    IndicatorMapping::new(indicator_type, obs.value.clone())
                })
        })
        .collect()
}

/// IPv4 / IPv6 observations: a `/prefix` below the host maximum classifies
/// as CIDR with the prefix retained, anything else as Address with the
/// prefix stripped.
fn ip_handler(observations: &[Observation]) -> Vec<IndicatorMapping> {
    let mut mappings = Vec::new();
    for obs in observations {
        let host_prefix = match obs.path.as_str() {
            "ipv4-addr:value" => "32",
            "ipv6-addr:value" => "128",
            _ => continue,
        };
        let mut mapping = match obs.value.split_once('/') {
            Some((_, prefix)) if prefix != host_prefix => {
                IndicatorMapping::new("CIDR", obs.value.clone())
            }
            Some((address, _)) => IndicatorMapping::new("Address", address),
            None => IndicatorMapping::new("Address", obs.value.clone()),
        };
        // The confidence placeholder rides only on IPv6 mappings.
        if host_prefix == "32" {
            mapping.confidence = None;
        }
        mappings.push(mapping);
    }
    mappings
}

/// File-hash observations. At most three pairs with no algorithm family
/// repeated consolidate into a single File mapping whose summary joins the
/// values with `" : "`; otherwise every pair becomes its own mapping.
fn file_handler(observations: &[Observation]) -> Vec<IndicatorMapping> {
    let files: Vec<&Observation> = observations
        .iter()
        .filter(|obs| obs.path.contains("file:hashes"))
        .collect();
    if files.is_empty() {
        return Vec::new();
    }

    let family_count = |token: &str| {
        files
            .iter()
            .filter(|obs| obs.path.to_uppercase().contains(token))
            .count()
    };

    if files.len() <= 3
        && family_count("SHA-256") <= 1
        && family_count("SHA-1") <= 1
        && family_count("MD5") <= 1
    {
        let summary = files
            .iter()
            .map(|obs| obs.value.as_str())
            .collect::<Vec<_>>()
            .join(" : ");
        vec![IndicatorMapping::new("File", summary)]
    } else {
        files
            .iter()
            .map(|obs| IndicatorMapping::new("File", obs.value.clone()))
            .collect()
    }
}
