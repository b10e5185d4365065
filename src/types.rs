//! Data model for platform-native indicator records and STIX 2.1 objects.

use serde::{Deserialize, Serialize};

/// Placeholder substituted by the platform's batch importer with the
/// importing document's confidence value.
pub const CONFIDENCE_PLACEHOLDER: &str = "@.confidence";

// ---------------------------------------------------------------------------
// Native indicator record
// ---------------------------------------------------------------------------

/// A platform-native indicator record as returned by the indicators API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndicatorRecord {
    /// Indicator type name (case-insensitive, e.g. "Host", "Address").
    #[serde(rename = "type")]
    pub indicator_type: String,
    /// The indicator's primary value; format varies by type. File hash
    /// summaries join multiple hashes with `" : "`.
    pub summary: String,
    /// Creation timestamp, `YYYY-MM-DDTHH:MM:SSZ`.
    pub date_added: String,
    /// Last modification timestamp, `YYYY-MM-DDTHH:MM:SSZ`.
    pub last_modified: String,
    /// Confidence 0–100.
    pub confidence: u8,
    /// Threat rating. The platform emits this as a number or a numeric
    /// string depending on API version, so it is kept as raw JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<serde_json::Value>,
    /// False marks the indicator inactive (revoked in STIX terms).
    pub active: bool,
    pub owner_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<Tag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_label: Vec<SecurityLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<Attribute>,
}

impl Default for IndicatorRecord {
    fn default() -> Self {
        Self {
            indicator_type: String::new(),
            summary: String::new(),
            date_added: String::new(),
            last_modified: String::new(),
            confidence: 0,
            rating: None,
            active: true,
            owner_name: String::new(),
            tag: Vec::new(),
            security_label: Vec::new(),
            attribute: Vec::new(),
        }
    }
}

/// A tag attached to an indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A security label (handling marker, e.g. a TLP color) on an indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityLabel {
    pub name: String,
}

/// A free-form attribute on an indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attribute {
    /// Attribute type name (case-insensitive, e.g. "Description").
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub value: String,
    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub last_modified: String,
    /// True if this attribute is the one shown in the platform UI.
    pub displayed: bool,
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            attribute_type: String::new(),
            value: String::new(),
            last_modified: String::new(),
            displayed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// STIX indicator
// ---------------------------------------------------------------------------

/// A STIX 2.1 Indicator object.
///
/// See <https://docs.oasis-open.org/cti/stix/v2.1/stix-v2.1.html#_muftrcpnf89v>.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StixIndicator {
    /// `indicator--<uuid5>`, derived deterministically from the owning
    /// organization, indicator type, and summary.
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub spec_version: String,
    pub pattern_type: String,
    pub pattern_version: String,
    pub lang: String,
    /// Millisecond-precision UTC timestamp with a trailing `Z`.
    pub created: String,
    pub modified: String,
    pub valid_from: String,
    pub name: String,
    pub description: String,
    /// A STIX pattern expression, e.g. `[domain-name:value = 'kqvri.com']`.
    pub pattern: String,
    pub indicator_types: Vec<String>,
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_marking_refs: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// STIX bundle
// ---------------------------------------------------------------------------

/// A STIX 2.1 Bundle wrapping a set of produced indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StixBundle {
    #[serde(rename = "type")]
    pub object_type: String,
    /// `bundle--<uuid4>`; bundles are transient containers, so the id is
    /// random rather than content-derived.
    pub id: String,
    pub objects: Vec<StixIndicator>,
}

// ---------------------------------------------------------------------------
// Consume mapping
// ---------------------------------------------------------------------------

/// A platform-native indicator mapping produced by the consume classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorMapping {
    /// Platform indicator type name (e.g. "Host", "CIDR", "File").
    #[serde(rename = "type")]
    pub indicator_type: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
}

impl IndicatorMapping {
    pub(crate) fn new(indicator_type: &str, summary: impl Into<String>) -> Self {
        Self {
            indicator_type: indicator_type.to_string(),
            summary: summary.into(),
            confidence: Some(CONFIDENCE_PLACEHOLDER.to_string()),
        }
    }
}
