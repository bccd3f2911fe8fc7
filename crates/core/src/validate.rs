//! Input validation shared by every adapter
//!
//! Validation runs before any backend call, in the same order for every
//! adapter, so the same bad input yields the same error everywhere.

use crate::error::ValidationError;
use crate::record::VectorRecord;
use std::collections::HashSet;
use tracing::warn;

/// Payload keys reserved by the adapters (record id and source text)
pub const RESERVED_PAYLOAD_KEYS: [&str; 2] = ["_id", "_text"];

/// Maximum collection name length
const MAX_COLLECTION_NAME_LEN: usize = 63;

/// Validate a collection name
///
/// Names are 1..=63 characters of `[A-Za-z0-9_-]`, starting and ending with
/// an alphanumeric character. This is the intersection of what Chroma and
/// Qdrant accept.
pub fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidCollectionName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(invalid("name is longer than 63 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(invalid("only ASCII letters, digits, '_' and '-' are allowed"));
    }
    let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}

/// Validate a single vector
pub fn validate_vector(id: &str, vector: &[f32]) -> Result<(), ValidationError> {
    if vector.is_empty() {
        return Err(ValidationError::InvalidVector {
            id: id.to_string(),
            reason: "vector is empty".to_string(),
        });
    }
    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::InvalidVector {
            id: id.to_string(),
            reason: format!("non-finite value at position {}", pos),
        });
    }
    Ok(())
}

/// Validate a list of record ids (for get/delete)
pub fn validate_ids(ids: &[String]) -> Result<(), ValidationError> {
    for id in ids {
        if id.is_empty() {
            return Err(ValidationError::InvalidId {
                id: id.clone(),
                reason: "id is empty".to_string(),
            });
        }
    }
    Ok(())
}

/// Validate records for upsert
///
/// Checks, in order: ids, duplicate ids, reserved payload keys, vector
/// contents, and that every record shares the first record's
/// dimensionality. Returns that dimensionality, or `None` for an empty
/// slice.
pub fn validate_records(records: &[VectorRecord]) -> Result<Option<usize>, ValidationError> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let dimension = first.dimension();

    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if record.id.is_empty() {
            return Err(ValidationError::InvalidId {
                id: record.id.clone(),
                reason: "id is empty".to_string(),
            });
        }
        if !seen.insert(record.id.as_str()) {
            return Err(ValidationError::DuplicateId(record.id.clone()));
        }
        if let Some(key) = record
            .payload
            .keys()
            .find(|k| RESERVED_PAYLOAD_KEYS.contains(&k.as_str()))
        {
            return Err(ValidationError::ReservedPayloadKey(key.clone()));
        }
        validate_vector(&record.id, &record.vector)?;
        if record.dimension() != dimension {
            return Err(ValidationError::DimensionMismatch {
                expected: dimension,
                got: record.dimension(),
            });
        }
    }
    Ok(Some(dimension))
}

/// Validate `n_results`
pub fn validate_n_results(n_results: usize) -> Result<(), ValidationError> {
    if n_results == 0 {
        return Err(ValidationError::InvalidNResults(n_results));
    }
    Ok(())
}

/// Clamp `n_results` to a backend maximum
///
/// Clamping is not fatal, but it is never silent: a warning is emitted on
/// the caller's tracing subscriber.
pub fn clamp_n_results(n_results: usize, max: usize, backend: &str) -> usize {
    if n_results > max {
        warn!(
            backend,
            requested = n_results,
            max,
            "n_results exceeds backend maximum, clamping"
        );
        max
    } else {
        n_results
    }
}
