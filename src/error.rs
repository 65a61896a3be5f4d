// ⚠️ Record Errors
// Failures raised where raw values (SQLite rows, CSV cells, CLI args) become typed records.
//
// The breeding engine itself never fails; anything malformed is rejected here,
// once, instead of being coerced into a default.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid date in {field}: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("unknown animal status: {0}")]
    UnknownStatus(String),

    #[error("unknown pairing status: {0}")]
    UnknownPairingStatus(String),

    #[error("unknown sex: {0}")]
    UnknownSex(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("male {male_id} is already part of pairing {pairing_id}")]
    DuplicateMale { pairing_id: String, male_id: String },
}

impl RecordError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        RecordError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date, naming the field on failure.
pub fn parse_date(field: &str, value: &str) -> Result<chrono::NaiveDate, RecordError> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        RecordError::InvalidDate {
            field: field.to_string(),
            value: value.to_string(),
        }
    })
}

/// Like [`parse_date`] but an empty cell means "no date".
pub fn parse_optional_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDate>, RecordError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(field, v).map(Some),
    }
}
