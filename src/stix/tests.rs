//! Tests for the produce translator and consume classifier.

use pretty_assertions::assert_eq;
use serde_json::json;

use super::consume::{consume_mappings, mappings_from_pattern};
use super::produce::{produce, produce_bundle, produce_json, produce_one};
use crate::error::StixError;
use crate::types::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn host_record() -> IndicatorRecord {
    IndicatorRecord {
        indicator_type: "Host".to_string(),
        summary: "kqvri.com".to_string(),
        date_added: "2020-09-08T19:16:25Z".to_string(),
        last_modified: "2020-09-10T04:00:00Z".to_string(),
        confidence: 72,
        owner_name: "Example Org".to_string(),
        ..Default::default()
    }
}

fn description_attribute(value: &str, displayed: bool, last_modified: &str) -> Attribute {
    Attribute {
        attribute_type: "Description".to_string(),
        value: value.to_string(),
        last_modified: last_modified.to_string(),
        displayed,
    }
}

// ---------------------------------------------------------------------------
// Produce: assembly
// ---------------------------------------------------------------------------

#[test]
fn test_produces_full_indicator() {
    let indicator = produce_one(&host_record(), None).unwrap().unwrap();

    assert_eq!(indicator.object_type, "indicator");
    assert_eq!(indicator.spec_version, "2.1");
    assert_eq!(indicator.pattern_type, "stix");
    assert_eq!(indicator.pattern_version, "2.1");
    assert_eq!(indicator.lang, "en");
    assert_eq!(indicator.pattern, "[domain-name:value = 'kqvri.com']");
    assert_eq!(indicator.created, "2020-09-08T19:16:25.000Z");
    assert_eq!(indicator.valid_from, "2020-09-08T19:16:25.000Z");
    assert_eq!(indicator.modified, "2020-09-10T04:00:00.000Z");
    assert_eq!(indicator.name, "kqvri.com");
    assert_eq!(indicator.indicator_types, vec!["malicious-activity"]);
    assert_eq!(indicator.confidence, 72);
    assert!(indicator.id.starts_with("indicator--"));
    assert_eq!(indicator.revoked, None);
    assert_eq!(indicator.labels, None);
    assert_eq!(indicator.object_marking_refs, None);
}

#[test]
fn test_lower_case_z_suffix_normalized() {
    let mut record = host_record();
    record.date_added = "2020-09-08T19:16:25z".to_string();
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.created, "2020-09-08T19:16:25.000Z");
}

#[test]
fn test_inactive_record_is_revoked() {
    let mut record = host_record();
    record.active = false;
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.revoked, Some(true));
}

#[test]
fn test_serialized_shape_omits_unset_options() {
    let value = serde_json::to_value(produce_one(&host_record(), None).unwrap().unwrap()).unwrap();
    assert_eq!(value["type"], "indicator");
    assert!(value.get("revoked").is_none());
    assert!(value.get("labels").is_none());
    assert!(value.get("object_marking_refs").is_none());
}

// ---------------------------------------------------------------------------
// Produce: deterministic ids
// ---------------------------------------------------------------------------

#[test]
fn test_id_is_deterministic() {
    let mut first = host_record();
    let mut second = host_record();
    first.confidence = 10;
    second.confidence = 90;

    let a = produce_one(&first, None).unwrap().unwrap();
    let b = produce_one(&second, None).unwrap().unwrap();
    assert_eq!(a.id, b.id);
}

#[test]
fn test_id_changes_with_owner_type_or_summary() {
    let base = produce_one(&host_record(), None).unwrap().unwrap();

    let mut other_owner = host_record();
    other_owner.owner_name = "Another Org".to_string();
    assert_ne!(base.id, produce_one(&other_owner, None).unwrap().unwrap().id);

    let mut other_summary = host_record();
    other_summary.summary = "other.example".to_string();
    assert_ne!(
        base.id,
        produce_one(&other_summary, None).unwrap().unwrap().id
    );

    let mut other_type = host_record();
    other_type.indicator_type = "URL".to_string();
    assert_ne!(base.id, produce_one(&other_type, None).unwrap().unwrap().id);
}

#[test]
fn test_owner_case_does_not_change_id() {
    let mut upper = host_record();
    upper.owner_name = "EXAMPLE ORG".to_string();
    let a = produce_one(&host_record(), None).unwrap().unwrap();
    let b = produce_one(&upper, None).unwrap().unwrap();
    assert_eq!(a.id, b.id);
}

// ---------------------------------------------------------------------------
// Produce: description selection
// ---------------------------------------------------------------------------

#[test]
fn test_displayed_description_wins_over_recency() {
    let mut record = host_record();
    record.attribute = vec![
        description_attribute("A", false, "2020-01-01T00:00:00Z"),
        description_attribute("B", true, "2019-01-01T00:00:00Z"),
    ];
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.description, "B");
}

#[test]
fn test_latest_description_wins_without_displayed() {
    let mut record = host_record();
    record.attribute = vec![
        description_attribute("old", false, "2019-06-01T00:00:00Z"),
        description_attribute("new", false, "2020-06-01T00:00:00Z"),
        description_attribute("middle", false, "2019-12-01T00:00:00Z"),
    ];
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.description, "new");
}

#[test]
fn test_tied_timestamps_keep_first_seen() {
    let mut record = host_record();
    record.attribute = vec![
        description_attribute("first", false, "2020-06-01T00:00:00Z"),
        description_attribute("second", false, "2020-06-01T00:00:00Z"),
    ];
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.description, "first");
}

#[test]
fn test_non_description_attributes_ignored() {
    let mut record = host_record();
    record.attribute = vec![Attribute {
        attribute_type: "Source".to_string(),
        value: "feed-7".to_string(),
        last_modified: "not a timestamp".to_string(),
        displayed: true,
    }];
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.description, "");
}

#[test]
fn test_malformed_attribute_timestamp_is_fatal() {
    let mut record = host_record();
    record.attribute = vec![description_attribute("A", true, "09/08/2020")];
    let err = produce_one(&record, None).unwrap_err();
    assert!(matches!(err, StixError::MalformedTimestamp { .. }));
}

// ---------------------------------------------------------------------------
// Produce: type resolution
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_type_skipped_without_error() {
    let mut record = host_record();
    record.indicator_type = "Document".to_string();
    assert!(produce_one(&record, None).unwrap().is_none());

    let produced: Vec<_> = produce(vec![record], None).collect();
    assert!(produced.is_empty());
}

#[test]
fn test_type_override_wins_over_record_type() {
    let mut record = host_record();
    record.indicator_type = "Document".to_string();
    let indicator = produce_one(&record, Some("Host")).unwrap().unwrap();
    assert_eq!(indicator.pattern, "[domain-name:value = 'kqvri.com']");
}

#[test]
fn test_mixed_records_skip_only_unknown() {
    let mut unknown = host_record();
    unknown.indicator_type = "Document".to_string();
    let produced: Vec<_> = produce(vec![host_record(), unknown, host_record()], None)
        .collect::<crate::Result<_>>()
        .unwrap();
    assert_eq!(produced.len(), 2);
}

// ---------------------------------------------------------------------------
// Produce: labels and markings
// ---------------------------------------------------------------------------

#[test]
fn test_tags_become_labels_in_order() {
    let mut record = host_record();
    record.tag = vec![
        Tag {
            name: "phishing".to_string(),
        },
        Tag {
            name: "campaign-7".to_string(),
        },
    ];
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(
        indicator.labels,
        Some(vec!["phishing".to_string(), "campaign-7".to_string()])
    );
}

#[test]
fn test_security_labels_map_to_marking_refs() {
    let mut record = host_record();
    record.security_label = vec![
        SecurityLabel {
            name: "TLP:AMBER".to_string(),
        },
        SecurityLabel {
            name: " tlp:green ".to_string(),
        },
        SecurityLabel {
            name: "internal-only".to_string(),
        },
    ];
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(
        indicator.object_marking_refs,
        Some(vec![
            "marking-definition--f88d31f6-486f-44da-b317-01333bde0b82".to_string(),
            "marking-definition--34098fce-860f-48ae-8e50-ebd3cc5e41da".to_string(),
        ])
    );
}

#[test]
fn test_rating_appends_threat_rating_label() {
    let mut record = host_record();
    record.tag = vec![Tag {
        name: "phishing".to_string(),
    }];
    record.rating = Some(json!(4));
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(
        indicator.labels,
        Some(vec![
            "phishing".to_string(),
            "Threat Rating: High".to_string()
        ])
    );
}

#[test]
fn test_rating_accepts_numeric_strings_and_floats() {
    let mut record = host_record();
    record.rating = Some(json!("3"));
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(
        indicator.labels,
        Some(vec!["Threat Rating: Medium".to_string()])
    );

    record.rating = Some(json!(4.7));
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(
        indicator.labels,
        Some(vec!["Threat Rating: High".to_string()])
    );
}

#[test]
fn test_unmappable_rating_is_dropped() {
    let mut record = host_record();
    record.rating = Some(json!("severe"));
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.labels, None);

    record.rating = Some(json!(11));
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.labels, None);
}

// ---------------------------------------------------------------------------
// Produce: pattern builders
// ---------------------------------------------------------------------------

#[test]
fn test_ipv6_summary_selects_ipv6_object() {
    let mut record = host_record();
    record.indicator_type = "Address".to_string();
    record.summary = "2001:db8::1".to_string();
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(indicator.pattern, "[ipv6-addr:value = '2001:db8::1']");
}

#[test]
fn test_file_summary_builds_per_hash_comparisons() {
    let mut record = host_record();
    record.indicator_type = "File".to_string();
    record.summary = concat!(
        "9e107d9d372bb6826bd81d3542a419d6",
        " : ",
        "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12",
        " : ",
        "50d858e0985ecc7f60418aaf0cc5ab587f42c2570a884095a9e8ccacd0f6545c"
    )
    .to_string();
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(
        indicator.pattern,
        "[file:hashes.MD5 = '9e107d9d372bb6826bd81d3542a419d6' \
         OR file:hashes.'SHA-1' = '2fd4e1c67a2d28fced849ee1bb76e7391b93eb12' \
         OR file:hashes.'SHA-256' = '50d858e0985ecc7f60418aaf0cc5ab587f42c2570a884095a9e8ccacd0f6545c']"
    );
}

#[test]
fn test_registry_key_summary_is_escaped() {
    let mut record = host_record();
    record.indicator_type = "Registry Key".to_string();
    record.summary = r"HKLM\Software\Bad".to_string();
    let indicator = produce_one(&record, None).unwrap().unwrap();
    assert_eq!(
        indicator.pattern,
        r"[windows-registry-key:key = 'HKLM\\Software\\Bad']"
    );
}

// ---------------------------------------------------------------------------
// Produce: JSON interface and bundles
// ---------------------------------------------------------------------------

#[test]
fn test_produce_json_accepts_object_or_array() {
    let record = json!({
        "type": "Host",
        "summary": "kqvri.com",
        "dateAdded": "2020-09-08T19:16:25Z",
        "lastModified": "2020-09-10T04:00:00Z",
        "confidence": 72,
        "ownerName": "Example Org",
        "tag": [{"name": "phishing"}]
    });

    let single = produce_json(record.clone(), None).unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].labels, Some(vec!["phishing".to_string()]));

    let several = produce_json(json!([record, {"type": "Document"}]), None).unwrap();
    assert_eq!(several.len(), 1);
}

#[test]
fn test_bundle_wraps_produced_indicators() {
    let mut unknown = host_record();
    unknown.indicator_type = "Document".to_string();
    let bundle = produce_bundle(vec![host_record(), unknown]).unwrap();
    assert_eq!(bundle.object_type, "bundle");
    assert!(bundle.id.starts_with("bundle--"));
    assert_eq!(bundle.objects.len(), 1);
}

// ---------------------------------------------------------------------------
// Consume: default handler
// ---------------------------------------------------------------------------

#[test]
fn test_default_handler_maps_known_paths() {
    let mappings = mappings_from_pattern(
        "[url:value = 'http://evil.example/a' AND email-addr:value = 'bad@evil.example' \
         AND domain-name:value = 'evil.example' AND autonomous-system:name = 'AS8075']",
    )
    .unwrap();
    assert_eq!(
        mappings,
        vec![
            IndicatorMapping::new("URL", "http://evil.example/a"),
            IndicatorMapping::new("EmailAddress", "bad@evil.example"),
            IndicatorMapping::new("Host", "evil.example"),
            IndicatorMapping::new("ASN", "AS8075"),
        ]
    );
}

#[test]
fn test_set_membership_values_classified_individually() {
    let mappings =
        mappings_from_pattern("[ipv4-addr:value IN ('1.1.1.1', '10.0.0.0/24')]").unwrap();
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].indicator_type, "Address");
    assert_eq!(mappings[0].summary, "1.1.1.1");
    assert_eq!(mappings[1].indicator_type, "CIDR");
    assert_eq!(mappings[1].summary, "10.0.0.0/24");
}

// ---------------------------------------------------------------------------
// Consume: IP handler
// ---------------------------------------------------------------------------

#[test]
fn test_ipv4_host_prefix_is_an_address() {
    let mappings = mappings_from_pattern("[ipv4-addr:value = '1.2.3.4/32']").unwrap();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].indicator_type, "Address");
    assert_eq!(mappings[0].summary, "1.2.3.4");
}

#[test]
fn test_ipv4_subnet_prefix_is_a_cidr() {
    let mappings = mappings_from_pattern("[ipv4-addr:value = '1.2.3.4/24']").unwrap();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].indicator_type, "CIDR");
    assert_eq!(mappings[0].summary, "1.2.3.4/24");
}

#[test]
fn test_ipv4_mapping_has_no_confidence_placeholder() {
    let mappings = mappings_from_pattern("[ipv4-addr:value = '1.2.3.4']").unwrap();
    assert_eq!(mappings[0].confidence, None);
}

#[test]
fn test_ipv6_boundaries_and_confidence() {
    let mappings = mappings_from_pattern(
        "[ipv6-addr:value = '2001:db8::1/128' OR ipv6-addr:value = '2001:db8::/64']",
    )
    .unwrap();
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].indicator_type, "Address");
    assert_eq!(mappings[0].summary, "2001:db8::1");
    assert_eq!(
        mappings[0].confidence,
        Some(CONFIDENCE_PLACEHOLDER.to_string())
    );
    assert_eq!(mappings[1].indicator_type, "CIDR");
    assert_eq!(mappings[1].summary, "2001:db8::/64");
}

// ---------------------------------------------------------------------------
// Consume: file handler
// ---------------------------------------------------------------------------

#[test]
fn test_three_hashes_one_per_family_consolidate() {
    let mappings = mappings_from_pattern(
        "[file:hashes.MD5 = 'm' OR file:hashes.'SHA-1' = 's1' OR file:hashes.'SHA-256' = 's2']",
    )
    .unwrap();
    assert_eq!(mappings, vec![IndicatorMapping::new("File", "m : s1 : s2")]);
}

#[test]
fn test_duplicate_family_splits_mappings() {
    let mappings =
        mappings_from_pattern("[file:hashes.MD5 = 'm1' OR file:hashes.MD5 = 'm2']").unwrap();
    assert_eq!(
        mappings,
        vec![
            IndicatorMapping::new("File", "m1"),
            IndicatorMapping::new("File", "m2"),
        ]
    );
}

#[test]
fn test_four_hashes_split_mappings() {
    let mappings = mappings_from_pattern(
        "[file:hashes.MD5 = 'm' OR file:hashes.'SHA-1' = 's1' \
         OR file:hashes.'SHA-256' = 's2' OR file:hashes.'SHA-512' = 's5']",
    )
    .unwrap();
    assert_eq!(mappings.len(), 4);
}

// ---------------------------------------------------------------------------
// Consume: composition
// ---------------------------------------------------------------------------

#[test]
fn test_handler_outputs_concatenate_in_fixed_order() {
    let mappings = mappings_from_pattern(
        "[file:hashes.MD5 = 'm'] AND [ipv4-addr:value = '1.2.3.4'] AND [domain-name:value = 'evil.example']",
    )
    .unwrap();
    assert_eq!(mappings.len(), 3);
    assert_eq!(mappings[0].indicator_type, "Host");
    assert_eq!(mappings[1].indicator_type, "Address");
    assert_eq!(mappings[2].indicator_type, "File");
}

#[test]
fn test_consume_is_idempotent() {
    let pattern = "[domain-name:value = 'evil.example' AND ipv4-addr:value IN ('1.1.1.1', '10.0.0.0/8')]";
    let first = mappings_from_pattern(pattern).unwrap();
    let second = mappings_from_pattern(pattern).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unsupported_operator_yields_empty_output() {
    let mappings = mappings_from_pattern("[ipv4-addr:value != '1.2.3.4']").unwrap();
    assert!(mappings.is_empty());
}

#[test]
fn test_consume_mappings_reads_pattern_field() {
    let stix = json!({
        "type": "indicator",
        "pattern": "[domain-name:value = 'evil.example']"
    });
    let mappings = consume_mappings(&stix).unwrap();
    assert_eq!(mappings, vec![IndicatorMapping::new("Host", "evil.example")]);

    let err = consume_mappings(&json!({"type": "indicator"})).unwrap_err();
    assert!(matches!(err, StixError::MissingPattern));
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn test_produced_pattern_consumes_back_to_native_type() {
    let indicator = produce_one(&host_record(), None).unwrap().unwrap();
    let mappings = mappings_from_pattern(&indicator.pattern).unwrap();
    assert_eq!(mappings, vec![IndicatorMapping::new("Host", "kqvri.com")]);
}
