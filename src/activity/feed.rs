//! Read side of the activity log: newest-first, time-windowed, with the
//! referenced entities joined in.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::db;
use crate::db::models::{ActivityKind, Difficulty};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSummary {
    pub id: String,
    pub text: String,
    pub created_at: String,
}

/// One activity with everything an observer needs to render it.
///
/// `exercise` is `None` when the exercise has been deleted since; the raw
/// `exercise_id` is still reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub created_at: String,
    pub actor: ActorSummary,
    pub exercise_id: Option<String>,
    pub exercise: Option<ExerciseSummary>,
    pub comment: Option<ContributionSummary>,
    pub solution: Option<ContributionSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub limit: u32,
    /// Only entries newer than this many days; `None` or 0 means no window.
    pub window_days: Option<u32>,
    /// Return entries strictly older than this activity id.
    pub before: Option<String>,
}

const ENTRY_SELECT: &str = "
    SELECT a.id, a.kind, a.message, a.created_at,
           u.id, u.name, u.email,
           a.exercise_id,
           e.id, e.title, e.subject, e.difficulty, e.created_at,
           c.id, c.text, c.created_at,
           s.id, s.text, s.created_at
    FROM activities a
    JOIN users u ON u.id = a.actor_id
    LEFT JOIN exercises e ON e.id = a.exercise_id
    LEFT JOIN comments c ON c.id = a.comment_id
    LEFT JOIN solutions s ON s.id = a.solution_id";

fn contribution_at(row: &Row<'_>, start: usize) -> rusqlite::Result<Option<ContributionSummary>> {
    let id: Option<String> = row.get(start)?;
    Ok(match id {
        Some(id) => Some(ContributionSummary {
            id,
            text: row.get(start + 1)?,
            created_at: row.get(start + 2)?,
        }),
        None => None,
    })
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<FeedEntry> {
    let exercise_ref: Option<String> = row.get(8)?;
    let exercise = match exercise_ref {
        Some(id) => Some(ExerciseSummary {
            id,
            title: row.get(9)?,
            subject: row.get(10)?,
            difficulty: row.get(11)?,
            created_at: row.get(12)?,
        }),
        None => None,
    };

    Ok(FeedEntry {
        id: row.get(0)?,
        kind: row.get(1)?,
        message: row.get(2)?,
        created_at: row.get(3)?,
        actor: ActorSummary {
            id: row.get(4)?,
            name: row.get(5)?,
            email: row.get(6)?,
        },
        exercise_id: row.get(7)?,
        exercise,
        comment: contribution_at(row, 13)?,
        solution: contribution_at(row, 16)?,
    })
}

/// Clamp a requested page size into `[1, max]`, falling back to `default`.
pub fn clamp_limit(requested: Option<i64>, default: u32, max: u32) -> u32 {
    let max = max.max(1);
    match requested {
        Some(n) => n.clamp(1, max as i64) as u32,
        None => default.clamp(1, max),
    }
}

/// Newest-first activity, ties on timestamp broken by insertion order.
pub fn recent_activity(conn: &Connection, query: &FeedQuery) -> AppResult<Vec<FeedEntry>> {
    // A window reaching past the representable past is no window at all
    let cutoff = query
        .window_days
        .filter(|days| *days > 0)
        .and_then(|days| Duration::try_days(days as i64))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .map(db::timestamp);

    let cursor: Option<(String, i64)> = match &query.before {
        Some(id) => Some(
            conn.query_row(
                "SELECT created_at, seq FROM activities WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| AppError::bad_request("Unknown activity cursor"))?,
        ),
        None => None,
    };
    let (before_at, before_seq) = match cursor {
        Some((at, seq)) => (Some(at), Some(seq)),
        None => (None, None),
    };

    let mut stmt = conn.prepare(&format!(
        "{}
         WHERE (?1 IS NULL OR a.created_at >= ?1)
           AND (?2 IS NULL OR a.created_at < ?2 OR (a.created_at = ?2 AND a.seq < ?3))
         ORDER BY a.created_at DESC, a.seq DESC
         LIMIT ?4",
        ENTRY_SELECT
    ))?;

    let entries = stmt
        .query_map(
            params![cutoff, before_at, before_seq, query.limit.max(1)],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Resolve a single activity into its denormalized form.
pub fn entry(conn: &Connection, activity_id: &str) -> AppResult<Option<FeedEntry>> {
    let entry = conn
        .query_row(
            &format!("{} WHERE a.id = ?1", ENTRY_SELECT),
            params![activity_id],
            from_row,
        )
        .optional()?;
    Ok(entry)
}
