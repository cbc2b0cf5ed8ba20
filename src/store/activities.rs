//! The activity log. Rows are only ever appended; the schema rejects
//! updates and deletes.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db;
use crate::db::models::{Activity, ActivityKind};
use crate::error::AppResult;

const COLUMNS: &str =
    "seq, id, kind, actor_id, exercise_id, comment_id, solution_id, message, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        seq: row.get(0)?,
        id: row.get(1)?,
        kind: row.get(2)?,
        actor_id: row.get(3)?,
        exercise_id: row.get(4)?,
        comment_id: row.get(5)?,
        solution_id: row.get(6)?,
        message: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// What to append. References are optional; which ones are set depends on
/// the kind.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub actor_id: String,
    pub exercise_id: Option<String>,
    pub comment_id: Option<String>,
    pub solution_id: Option<String>,
    pub message: String,
}

pub fn append(conn: &Connection, new: &NewActivity) -> AppResult<Activity> {
    let id = db::new_id();
    let created_at = db::now();

    conn.execute(
        "INSERT INTO activities (id, kind, actor_id, exercise_id, comment_id, solution_id, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            new.kind,
            new.actor_id,
            new.exercise_id,
            new.comment_id,
            new.solution_id,
            new.message,
            created_at,
        ],
    )?;

    Ok(Activity {
        seq: conn.last_insert_rowid(),
        id,
        kind: new.kind,
        actor_id: new.actor_id.clone(),
        exercise_id: new.exercise_id.clone(),
        comment_id: new.comment_id.clone(),
        solution_id: new.solution_id.clone(),
        message: new.message.clone(),
        created_at,
    })
}

pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Activity>> {
    let activity = conn
        .query_row(
            &format!("SELECT {} FROM activities WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?;
    Ok(activity)
}
