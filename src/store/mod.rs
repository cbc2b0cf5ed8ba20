//! Durable records, one entity at a time.
//!
//! Every function takes a borrowed connection so callers decide how many
//! statements share it. Ownership rules are enforced by the command layer,
//! not here.

pub mod activities;
pub mod contributions;
pub mod exercises;
pub mod saves;
pub mod users;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

// JSON text columns (tags, attachment lists) decode leniently: a malformed
// value reads as empty rather than failing the whole row.
pub(crate) fn decode_list<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub(crate) fn encode_list<T: Serialize>(items: &[T]) -> AppResult<String> {
    Ok(serde_json::to_string(items)?)
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
