//! Error types for the STIX translation layer.

use thiserror::Error;

use crate::pattern::PatternError;

#[derive(Debug, Error)]
pub enum StixError {
    #[error("malformed timestamp {value:?}: {source}")]
    MalformedTimestamp {
        value: String,
        #[source]
        source: chrono::format::ParseError,
    },

    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("record has no pattern field")]
    MissingPattern,

    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StixError>;
