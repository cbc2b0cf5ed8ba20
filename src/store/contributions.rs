//! Comments and solutions. Both tables share one shape and one set of
//! queries; `ContributionKind` picks the table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{decode_list, encode_list, exercises, is_foreign_key_violation};
use crate::db;
use crate::db::models::{Attachment, Contribution, ContributionKind};
use crate::error::{AppError, AppResult};

const COLUMNS: &str = "id, exercise_id, author_id, text, attachments, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Contribution> {
    Ok(Contribution {
        id: row.get(0)?,
        exercise_id: row.get(1)?,
        author_id: row.get(2)?,
        text: row.get(3)?,
        attachments: decode_list(&row.get::<_, String>(4)?),
        created_at: row.get(5)?,
    })
}

pub fn insert(
    conn: &Connection,
    kind: ContributionKind,
    exercise_id: &str,
    author_id: &str,
    text: &str,
    attachments: &[Attachment],
) -> AppResult<Contribution> {
    let contribution = Contribution {
        id: db::new_id(),
        exercise_id: exercise_id.to_string(),
        author_id: author_id.to_string(),
        text: text.to_string(),
        attachments: attachments.to_vec(),
        created_at: db::now(),
    };

    let inserted = conn.execute(
        &format!(
            "INSERT INTO {} (id, exercise_id, author_id, text, attachments, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            kind.table()
        ),
        params![
            contribution.id,
            contribution.exercise_id,
            contribution.author_id,
            contribution.text,
            encode_list(&contribution.attachments)?,
            contribution.created_at,
        ],
    );

    if let Err(e) = inserted {
        // The exercise can vanish between the caller's lookup and this insert
        if is_foreign_key_violation(&e) && !exercises::exists(conn, exercise_id)? {
            return Err(AppError::not_found("Exercise"));
        }
        return Err(e.into());
    }

    Ok(contribution)
}

pub fn find_by_id(
    conn: &Connection,
    kind: ContributionKind,
    id: &str,
) -> AppResult<Option<Contribution>> {
    let found = conn
        .query_row(
            &format!("SELECT {} FROM {} WHERE id = ?1", COLUMNS, kind.table()),
            params![id],
            from_row,
        )
        .optional()?;
    Ok(found)
}

pub fn list_for_exercise(
    conn: &Connection,
    kind: ContributionKind,
    exercise_id: &str,
) -> AppResult<Vec<Contribution>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE exercise_id = ?1 ORDER BY created_at DESC, id DESC",
        COLUMNS,
        kind.table()
    ))?;
    let rows = stmt
        .query_map(params![exercise_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_by_author(
    conn: &Connection,
    kind: ContributionKind,
    author_id: &str,
) -> AppResult<Vec<Contribution>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE author_id = ?1 ORDER BY created_at DESC, id DESC",
        COLUMNS,
        kind.table()
    ))?;
    let rows = stmt
        .query_map(params![author_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_for_exercise(
    conn: &Connection,
    kind: ContributionKind,
    exercise_id: &str,
) -> AppResult<usize> {
    let rows = conn.execute(
        &format!("DELETE FROM {} WHERE exercise_id = ?1", kind.table()),
        params![exercise_id],
    )?;
    Ok(rows)
}
