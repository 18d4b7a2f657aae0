use thiserror::Error;

#[derive(Debug, Error)]
pub enum IbdError {
    /// The header lacks one or more required columns
    #[error("missing columns in {source_name}: {}. Required: {}", .missing.join(", "), .required.join(", "))]
    MissingColumns {
        source_name: String,
        missing: Vec<String>,
        required: Vec<String>,
    },

    #[error("no valid rows in {0}")]
    NoValidRows(String),

    /// Only raised under the strict row policy
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("duplicate observation for {a}/{b} on {chr} at window {index}")]
    DuplicateObservation {
        a: String,
        b: String,
        chr: String,
        index: usize,
    },

    #[error("malformed pair line {line}: expected two tab-separated labels")]
    MalformedPair { line: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
