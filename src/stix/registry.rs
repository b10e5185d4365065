//! Static registry of per-type STIX pattern builders and the shared
//! marking / threat-rating vocabularies.
//!
//! The registry is configuration, not logic: it is populated at compile
//! time and never mutated.

use crate::types::IndicatorRecord;

// ---------------------------------------------------------------------------
// Type details
// ---------------------------------------------------------------------------

/// Pattern-construction details for one platform indicator type.
pub struct TypeDetails {
    /// Builds a STIX pattern expression string from a native record.
    pub build_pattern: fn(&IndicatorRecord) -> String,
}

/// Look up the details for a platform indicator type name.
///
/// Matching is case-insensitive and whitespace-tolerant; unknown names
/// return `None`.
pub fn lookup(type_name: &str) -> Option<&'static TypeDetails> {
    match type_name.trim().to_lowercase().as_str() {
        "address" => Some(&ADDRESS),
        "cidr" => Some(&CIDR),
        "emailaddress" | "email address" => Some(&EMAIL_ADDRESS),
        "file" => Some(&FILE),
        "host" => Some(&HOST),
        "url" => Some(&URL),
        "asn" => Some(&ASN),
        "mutex" => Some(&MUTEX),
        "registry key" => Some(&REGISTRY_KEY),
        _ => None,
    }
}

static ADDRESS: TypeDetails = TypeDetails {
    build_pattern: address_pattern,
};
static CIDR: TypeDetails = TypeDetails {
    build_pattern: address_pattern,
};
static EMAIL_ADDRESS: TypeDetails = TypeDetails {
    build_pattern: email_address_pattern,
};
static FILE: TypeDetails = TypeDetails {
    build_pattern: file_pattern,
};
static HOST: TypeDetails = TypeDetails {
    build_pattern: host_pattern,
};
static URL: TypeDetails = TypeDetails {
    build_pattern: url_pattern,
};
static ASN: TypeDetails = TypeDetails {
    build_pattern: asn_pattern,
};
static MUTEX: TypeDetails = TypeDetails {
    build_pattern: mutex_pattern,
};
static REGISTRY_KEY: TypeDetails = TypeDetails {
    build_pattern: registry_key_pattern,
};

// ---------------------------------------------------------------------------
// Pattern builders
// ---------------------------------------------------------------------------

/// Addresses and CIDR ranges share one builder; the address family is
/// inferred from the summary.
fn address_pattern(record: &IndicatorRecord) -> String {
    let object_type = if record.summary.contains(':') {
        "ipv6-addr"
    } else {
        "ipv4-addr"
    };
    format!(
        "[{}:value = '{}']",
        object_type,
        escape_literal(&record.summary)
    )
}

fn email_address_pattern(record: &IndicatorRecord) -> String {
    format!("[email-addr:value = '{}']", escape_literal(&record.summary))
}

fn host_pattern(record: &IndicatorRecord) -> String {
    format!(
        "[domain-name:value = '{}']",
        escape_literal(&record.summary)
    )
}

fn url_pattern(record: &IndicatorRecord) -> String {
    format!("[url:value = '{}']", escape_literal(&record.summary))
}

fn asn_pattern(record: &IndicatorRecord) -> String {
    format!(
        "[autonomous-system:name = '{}']",
        escape_literal(&record.summary)
    )
}

fn mutex_pattern(record: &IndicatorRecord) -> String {
    format!("[mutex:name = '{}']", escape_literal(&record.summary))
}

fn registry_key_pattern(record: &IndicatorRecord) -> String {
    format!(
        "[windows-registry-key:key = '{}']",
        escape_literal(&record.summary)
    )
}

/// File summaries hold one or more hashes joined by `" : "`; each hash is
/// classified by its hex length.
fn file_pattern(record: &IndicatorRecord) -> String {
    let comparisons: Vec<String> = record
        .summary
        .split(" : ")
        .map(str::trim)
        .filter(|hash| !hash.is_empty())
        .map(|hash| {
            let literal = escape_literal(hash);
            match hash.len() {
                40 => format!("file:hashes.'SHA-1' = '{literal}'"),
                64 => format!("file:hashes.'SHA-256' = '{literal}'"),
                128 => format!("file:hashes.'SHA-512' = '{literal}'"),
                _ => format!("file:hashes.MD5 = '{literal}'"),
            }
        })
        .collect();
    format!("[{}]", comparisons.join(" OR "))
}

/// Escape a value for inclusion in a single-quoted STIX pattern literal.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

// ---------------------------------------------------------------------------
// Security labels
// ---------------------------------------------------------------------------

/// TLP security-label names mapped to the standard STIX 2.1 TLP
/// marking-definition ids.
const SECURITY_LABEL_MARKINGS: &[(&str, &str)] = &[
    (
        "tlp:white",
        "marking-definition--613f2e26-407d-48c7-9eca-b8e91df99dc9",
    ),
    (
        "tlp:green",
        "marking-definition--34098fce-860f-48ae-8e50-ebd3cc5e41da",
    ),
    (
        "tlp:amber",
        "marking-definition--f88d31f6-486f-44da-b317-01333bde0b82",
    ),
    (
        "tlp:red",
        "marking-definition--5e57c739-391a-4eb3-b6be-7d15ca92d5ed",
    ),
];

/// Translate a platform security-label name to a STIX marking ref.
pub fn marking_ref(security_label: &str) -> Option<&'static str> {
    let needle = security_label.trim().to_lowercase();
    SECURITY_LABEL_MARKINGS
        .iter()
        .find(|(name, _)| *name == needle)
        .map(|(_, id)| *id)
}

// ---------------------------------------------------------------------------
// Threat ratings
// ---------------------------------------------------------------------------

const THREAT_RATING_LABELS: [&str; 6] = [
    "Threat Rating: Unknown",
    "Threat Rating: Suspicious",
    "Threat Rating: Low",
    "Threat Rating: Medium",
    "Threat Rating: High",
    "Threat Rating: Critical",
];

/// Translate a 0–5 platform threat rating to its STIX label.
pub fn threat_rating_label(rating: i64) -> Option<&'static str> {
    usize::try_from(rating)
        .ok()
        .and_then(|index| THREAT_RATING_LABELS.get(index))
        .copied()
}
