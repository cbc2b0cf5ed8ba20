//! Bookmarks. At most one row per (user, exercise) pair, enforced by a
//! unique index, so concurrent saves can never leave a duplicate behind.

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::db;
use crate::db::models::SavedExercise;
use crate::error::AppResult;

const COLUMNS: &str = "id, user_id, exercise_id, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<SavedExercise> {
    Ok(SavedExercise {
        id: row.get(0)?,
        user_id: row.get(1)?,
        exercise_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn find(
    conn: &Connection,
    user_id: &str,
    exercise_id: &str,
) -> AppResult<Option<SavedExercise>> {
    let saved = conn
        .query_row(
            &format!(
                "SELECT {} FROM saved_exercises WHERE user_id = ?1 AND exercise_id = ?2",
                COLUMNS
            ),
            params![user_id, exercise_id],
            from_row,
        )
        .optional()?;
    Ok(saved)
}

pub fn is_saved(conn: &Connection, user_id: &str, exercise_id: &str) -> AppResult<bool> {
    Ok(find(conn, user_id, exercise_id)?.is_some())
}

/// Idempotent: saving an already-saved exercise returns the existing row.
pub fn save(conn: &Connection, user_id: &str, exercise_id: &str) -> AppResult<SavedExercise> {
    conn.execute(
        "INSERT OR IGNORE INTO saved_exercises (id, user_id, exercise_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![db::new_id(), user_id, exercise_id, db::now()],
    )?;

    let saved = conn.query_row(
        &format!(
            "SELECT {} FROM saved_exercises WHERE user_id = ?1 AND exercise_id = ?2",
            COLUMNS
        ),
        params![user_id, exercise_id],
        from_row,
    )?;
    Ok(saved)
}

/// Returns whether a row was removed.
pub fn unsave(conn: &Connection, user_id: &str, exercise_id: &str) -> AppResult<bool> {
    let rows = conn.execute(
        "DELETE FROM saved_exercises WHERE user_id = ?1 AND exercise_id = ?2",
        params![user_id, exercise_id],
    )?;
    Ok(rows > 0)
}

/// Flip the saved state for one pair and return the new state.
///
/// Runs under an immediate (write-locked) transaction so two concurrent
/// toggles from the same user serialize instead of interleaving.
pub fn toggle(conn: &mut Connection, user_id: &str, exercise_id: &str) -> AppResult<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let saved = if unsave(&tx, user_id, exercise_id)? {
        false
    } else {
        save(&tx, user_id, exercise_id)?;
        true
    };
    tx.commit()?;
    Ok(saved)
}

/// Newest first.
pub fn list_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<SavedExercise>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM saved_exercises WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![user_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_for_exercise(conn: &Connection, exercise_id: &str) -> AppResult<usize> {
    let rows = conn.execute(
        "DELETE FROM saved_exercises WHERE exercise_id = ?1",
        params![exercise_id],
    )?;
    Ok(rows)
}
