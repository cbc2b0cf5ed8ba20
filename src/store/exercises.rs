use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{contributions, decode_list, encode_list, saves};
use crate::counts;
use crate::db;
use crate::db::models::{Attachment, ContributionKind, Difficulty, Exercise};
use crate::error::{AppError, AppResult};

const COLUMNS: &str =
    "id, title, description, subject, difficulty, tags, attachments, created_by, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        subject: row.get(3)?,
        difficulty: row.get(4)?,
        tags: decode_list(&row.get::<_, String>(5)?),
        attachments: decode_list(&row.get::<_, String>(6)?),
        created_by: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
}

/// Rows removed by a cascade delete, children first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub comments: usize,
    pub solutions: usize,
    pub saves: usize,
}

pub fn insert(
    conn: &Connection,
    created_by: &str,
    input: &NewExercise,
    attachments: &[Attachment],
) -> AppResult<Exercise> {
    let now = db::now();
    let exercise = Exercise {
        id: db::new_id(),
        title: input.title.clone(),
        description: input.description.clone(),
        subject: input.subject.clone(),
        difficulty: input.difficulty,
        tags: input.tags.clone(),
        attachments: attachments.to_vec(),
        created_by: created_by.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO exercises (id, title, description, subject, difficulty, tags, attachments, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            exercise.id,
            exercise.title,
            exercise.description,
            exercise.subject,
            exercise.difficulty,
            encode_list(&exercise.tags)?,
            encode_list(&exercise.attachments)?,
            exercise.created_by,
            exercise.created_at,
            exercise.updated_at,
        ],
    )?;

    Ok(exercise)
}

pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Exercise>> {
    let exercise = conn
        .query_row(
            &format!("SELECT {} FROM exercises WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?;
    Ok(exercise)
}

pub fn get(conn: &Connection, id: &str) -> AppResult<Exercise> {
    find_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Exercise"))
}

pub fn exists(conn: &Connection, id: &str) -> AppResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM exercises WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Newest first, optionally only those created by one user.
pub fn list(conn: &Connection, created_by: Option<&str>) -> AppResult<Vec<Exercise>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM exercises
         WHERE (?1 IS NULL OR created_by = ?1)
         ORDER BY created_at DESC, id DESC",
        COLUMNS
    ))?;

    let exercises = stmt
        .query_map(params![created_by], from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(exercises)
}

/// Every exercise among `ids` that still exists, in no particular order.
pub fn find_many(conn: &Connection, ids: &[String]) -> AppResult<Vec<Exercise>> {
    find_in_chunks(conn, ids, counts::IDS_PER_QUERY)
}

fn find_in_chunks(
    conn: &Connection,
    ids: &[String],
    chunk_size: usize,
) -> AppResult<Vec<Exercise>> {
    let mut found = Vec::with_capacity(ids.len());
    if ids.is_empty() {
        return Ok(found);
    }

    let tx = conn.unchecked_transaction()?;
    for chunk in ids.chunks(chunk_size.max(1)) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM exercises WHERE id IN ({})",
            COLUMNS, placeholders
        ))?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        found.extend(rows);
    }
    tx.finish()?;

    Ok(found)
}

/// Persist the mutable fields of an exercise. The creator never changes.
pub fn update(conn: &Connection, exercise: &mut Exercise) -> AppResult<()> {
    exercise.updated_at = db::now();
    let rows = conn.execute(
        "UPDATE exercises
         SET title = ?1, description = ?2, subject = ?3, difficulty = ?4,
             tags = ?5, attachments = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            exercise.title,
            exercise.description,
            exercise.subject,
            exercise.difficulty,
            encode_list(&exercise.tags)?,
            encode_list(&exercise.attachments)?,
            exercise.updated_at,
            exercise.id,
        ],
    )?;

    if rows == 0 {
        return Err(AppError::not_found("Exercise"));
    }
    Ok(())
}

/// Delete an exercise together with its comments, solutions and saves.
///
/// Children go first, then the parent, inside one immediate transaction: a
/// failure at any step leaves everything in place. Activity rows that mention
/// the exercise are kept.
pub fn delete_cascade(conn: &mut Connection, id: &str) -> AppResult<CascadeReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !exists(&tx, id)? {
        return Err(AppError::not_found("Exercise"));
    }

    let report = CascadeReport {
        comments: contributions::delete_for_exercise(&tx, ContributionKind::Comment, id)?,
        solutions: contributions::delete_for_exercise(&tx, ContributionKind::Solution, id)?,
        saves: saves::delete_for_exercise(&tx, id)?,
    };
    tx.execute("DELETE FROM exercises WHERE id = ?1", params![id])?;
    tx.commit()?;

    Ok(report)
}
