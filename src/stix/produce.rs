//! Produce translator: platform indicator records to STIX 2.1 Indicators.

use chrono::NaiveDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StixError};
use crate::stix::registry;
use crate::types::{Attribute, IndicatorRecord, StixBundle, StixIndicator};

/// Translate records into STIX Indicators, one per accepted record.
///
/// Records whose type has no registry entry are skipped without error.
/// Emission order matches input order; records are translated independently,
/// so a failed record only affects its own item.
pub fn produce<'a, I>(
    records: I,
    indicator_type: Option<&'a str>,
) -> impl Iterator<Item = Result<StixIndicator>> + 'a
where
    I: IntoIterator<Item = IndicatorRecord> + 'a,
{
    records
        .into_iter()
        .filter_map(move |record| produce_one(&record, indicator_type).transpose())
}

/// Translate a single record. Returns `Ok(None)` when the record's type has
/// no registry entry.
pub fn produce_one(
    record: &IndicatorRecord,
    indicator_type: Option<&str>,
) -> Result<Option<StixIndicator>> {
    let type_name = indicator_type.unwrap_or(&record.indicator_type);
    let Some(details) = registry::lookup(type_name) else {
        debug!(
            indicator_type = %type_name,
            summary = %record.summary,
            "no registry entry for indicator type, skipping record"
        );
        return Ok(None);
    };

    let mut labels: Vec<String> = record.tag.iter().map(|tag| tag.name.clone()).collect();

    let mut object_marking_refs = Vec::new();
    for label in &record.security_label {
        if let Some(marking) = registry::marking_ref(&label.name) {
            object_marking_refs.push(marking.to_string());
        }
    }

    let description = select_description(&record.attribute)?;

    // Rating translation is best-effort: a rating that fails to parse or
    // map is dropped, and the rest of the record is unaffected.
    match threat_rating(record.rating.as_ref()) {
        Some(label) => labels.push(label.to_string()),
        None => {
            if record.rating.is_some() {
                debug!(rating = ?record.rating, "unmappable rating, dropping threat-rating label");
            }
        }
    }

    Ok(Some(StixIndicator {
        id: derive_id(&record.owner_name, type_name, &record.summary),
        object_type: "indicator".to_string(),
        spec_version: "2.1".to_string(),
        pattern_type: "stix".to_string(),
        pattern_version: "2.1".to_string(),
        lang: "en".to_string(),
        created: add_milliseconds(&record.date_added),
        modified: add_milliseconds(&record.last_modified),
        valid_from: add_milliseconds(&record.date_added),
        name: record.summary.clone(),
        description,
        pattern: (details.build_pattern)(record),
        indicator_types: vec!["malicious-activity".to_string()],
        confidence: record.confidence,
        revoked: (!record.active).then_some(true),
        labels: (!labels.is_empty()).then_some(labels),
        object_marking_refs: (!object_marking_refs.is_empty()).then_some(object_marking_refs),
    }))
}

/// Translate a JSON-shaped record or array of records.
pub fn produce_json(
    data: serde_json::Value,
    indicator_type: Option<&str>,
) -> Result<Vec<StixIndicator>> {
    let records: Vec<IndicatorRecord> = match data {
        serde_json::Value::Array(_) => serde_json::from_value(data)?,
        other => vec![serde_json::from_value(other)?],
    };
    produce(records, indicator_type).collect()
}

/// Translate records and wrap the results in a STIX Bundle.
pub fn produce_bundle<I>(records: I) -> Result<StixBundle>
where
    I: IntoIterator<Item = IndicatorRecord>,
{
    let objects = produce(records, None).collect::<Result<Vec<_>>>()?;
    Ok(StixBundle {
        object_type: "bundle".to_string(),
        id: format!("bundle--{}", Uuid::new_v4()),
        objects,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ATTRIBUTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Normalize a platform timestamp to millisecond precision.
///
/// `2020-09-08T19:16:25Z` becomes `2020-09-08T19:16:25.000Z`; a lower-case
/// `z` suffix is accepted. The transformation is purely textual, no
/// validation happens here.
fn add_milliseconds(time: &str) -> String {
    let had_suffix = time.to_ascii_lowercase().ends_with('z');
    let bare: String = time
        .to_ascii_uppercase()
        .chars()
        .filter(|c| *c != 'Z')
        .collect();
    if had_suffix {
        format!("{bare}.000Z")
    } else {
        format!("{bare}.000")
    }
}

/// Pick the record's description from its attributes.
///
/// An attribute flagged `displayed` wins outright and stops the scan;
/// otherwise the most recently modified description wins, with first-seen
/// order breaking ties. A malformed attribute timestamp is fatal for the
/// record.
fn select_description(attributes: &[Attribute]) -> Result<String> {
    let mut latest: Option<NaiveDateTime> = None;
    let mut description = String::new();
    for attribute in attributes {
        if !attribute.attribute_type.eq_ignore_ascii_case("description") {
            continue;
        }
        let modified =
            NaiveDateTime::parse_from_str(&attribute.last_modified, ATTRIBUTE_TIMESTAMP_FORMAT)
                .map_err(|source| StixError::MalformedTimestamp {
                    value: attribute.last_modified.clone(),
                    source,
                })?;
        if attribute.displayed {
            return Ok(attribute.value.clone());
        }
        if latest.map_or(true, |seen| modified > seen) {
            latest = Some(modified);
            description = attribute.value.clone();
        }
    }
    Ok(description)
}

/// Deterministic indicator id: a name-based UUID over owner, type, and
/// summary. Identical inputs always yield the identical id.
fn derive_id(owner_name: &str, type_name: &str, summary: &str) -> String {
    let name = format!(
        "{}-{}-{}",
        owner_name.to_lowercase(),
        type_name.to_lowercase(),
        summary
    );
    format!(
        "indicator--{}",
        Uuid::new_v5(&Uuid::NAMESPACE_X500, name.as_bytes())
    )
}

/// Map a raw rating value to its threat-rating label. Integer-valued JSON
/// numbers and integer strings are accepted; anything else is `None`.
fn threat_rating(rating: Option<&serde_json::Value>) -> Option<&'static str> {
    let value = match rating? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    registry::threat_rating_label(value)
}

#[cfg(test)]
mod timestamp_tests {
    use super::add_milliseconds;

    #[test]
    fn appends_milliseconds() {
        assert_eq!(
            add_milliseconds("2020-09-08T19:16:25Z"),
            "2020-09-08T19:16:25.000Z"
        );
    }

    #[test]
    fn lower_case_suffix() {
        assert_eq!(
            add_milliseconds("2020-09-08T19:16:25z"),
            "2020-09-08T19:16:25.000Z"
        );
    }

    #[test]
    fn missing_suffix_left_bare() {
        assert_eq!(
            add_milliseconds("2020-09-08T19:16:25"),
            "2020-09-08T19:16:25.000"
        );
    }
}
