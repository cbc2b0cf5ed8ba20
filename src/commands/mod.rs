//! Mutating and reading operations behind the HTTP surface.
//!
//! A mutating command validates first, then writes the primary record, then
//! records the derived activity (best effort) and answers with fresh counts.
//! Each command borrows a single pooled connection for all of its database
//! work after uploads have been stored.

pub mod discussion;
pub mod exercises;
pub mod saves;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;

/// Only the creator may change or delete what they created.
pub(crate) fn ensure_owner(user: &CurrentUser, owner_id: &str) -> AppResult<()> {
    if user.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
