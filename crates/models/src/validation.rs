//! Name and record-type rules. Pure functions, no state.

use crate::errors::ModelError;
use crate::record::Record;

pub const NAME_MIN_CHARS: usize = 4;
pub const NAME_MAX_CHARS: usize = 100;

/// Check the length bounds on the raw input, then return the storage key:
/// lower-cased and trimmed.
///
/// Length is counted in Unicode scalar values before trimming, so
/// `"github "` (7 chars) is accepted and keyed as `"github"`.
pub fn validate_name(name: &str) -> Result<String, ModelError> {
    if name.is_empty() {
        return Err(ModelError::validation("the name field cannot be empty"));
    }

    let len = name.chars().count();
    if len > NAME_MAX_CHARS {
        return Err(ModelError::validation("the name is too long"));
    }
    if len < NAME_MIN_CHARS {
        return Err(ModelError::validation("the name is too short"));
    }

    let key = name.to_lowercase().trim().to_string();
    if key.is_empty() {
        return Err(ModelError::validation("the name field cannot be blank"));
    }
    Ok(key)
}

/// Exact, case-sensitive membership in the configured allow-list.
pub fn validate_type<'a>(record_type: &'a str, allowed: &[String]) -> Result<&'a str, ModelError> {
    if allowed.iter().any(|t| t == record_type) {
        Ok(record_type)
    } else {
        Err(ModelError::validation("undefined record type"))
    }
}

pub fn validate_record(record: &Record, allowed: &[String]) -> Result<(), ModelError> {
    validate_type(&record.record_type, allowed)?;
    Ok(())
}
