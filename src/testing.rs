//! Shared helpers for unit tests.

use tempfile::TempDir;

use crate::config::Config;
use crate::db;
use crate::extractors::CurrentUser;
use crate::state::{AppState, DbPool};
use crate::store::fixtures;

/// Migrated in-memory database. The pool holds exactly one connection.
pub fn pool() -> DbPool {
    let pool = db::memory_pool().unwrap();
    db::run_migrations(&pool).unwrap();
    pool
}

/// App state over an in-memory database, with uploads in a temp directory
/// that lives as long as the returned guard.
pub fn state() -> (AppState, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.auth.bcrypt_cost = 4;
    config.resolve_paths(tmp.path());
    (AppState::new(pool(), config), tmp)
}

/// Register a user directly in the store and return them as a caller.
pub fn caller(state: &AppState, name: &str) -> CurrentUser {
    let conn = state.db.get().unwrap();
    let user = fixtures::user(&conn, name);
    CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
    }
}

/// A caller whose user row does not exist, so any write naming them fails.
pub fn ghost() -> CurrentUser {
    CurrentUser {
        id: "ghost".to_string(),
        name: "Ghost".to_string(),
        email: "ghost@example.com".to_string(),
    }
}

/// Number of blobs currently in the uploads directory.
pub fn stored_files(state: &AppState) -> usize {
    std::fs::read_dir(state.config.uploads_path())
        .map(|dir| dir.count())
        .unwrap_or(0)
}
