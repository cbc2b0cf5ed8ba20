//! Derived per-exercise counters.
//!
//! Counts are never stored on the exercise row; every read recomputes them
//! from the child tables so they cannot drift.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExerciseCounts {
    #[serde(rename = "savesCount")]
    pub saves: i64,
    #[serde(rename = "commentsCount")]
    pub comments: i64,
    #[serde(rename = "solutionsCount")]
    pub solutions: i64,
}

const CHILD_TABLES: [&str; 3] = ["saved_exercises", "comments", "solutions"];

impl ExerciseCounts {
    fn set(&mut self, table: &str, count: i64) {
        match table {
            "saved_exercises" => self.saves = count,
            "comments" => self.comments = count,
            _ => self.solutions = count,
        }
    }
}

/// Counts for one exercise. The three counts are read in one transaction so
/// they describe the same moment.
pub fn counts_for(conn: &Connection, exercise_id: &str) -> AppResult<ExerciseCounts> {
    let tx = conn.unchecked_transaction()?;
    let mut counts = ExerciseCounts::default();
    for table in CHILD_TABLES {
        let count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE exercise_id = ?1", table),
            params![exercise_id],
            |row| row.get(0),
        )?;
        counts.set(table, count);
    }
    tx.finish()?;
    Ok(counts)
}

/// Ids bound per `IN (...)` query, well under SQLite's variable limit.
pub(crate) const IDS_PER_QUERY: usize = 500;

/// Grouped counts for many exercises at once: three queries per chunk of ids
/// instead of three per exercise. Every requested id is present in the
/// result, zero-filled if it has no children.
pub fn counts_for_many(
    conn: &Connection,
    exercise_ids: &[String],
) -> AppResult<HashMap<String, ExerciseCounts>> {
    counts_in_chunks(conn, exercise_ids, IDS_PER_QUERY)
}

// All chunks share one read transaction, so the whole page is one snapshot.
fn counts_in_chunks(
    conn: &Connection,
    exercise_ids: &[String],
    chunk_size: usize,
) -> AppResult<HashMap<String, ExerciseCounts>> {
    let mut result: HashMap<String, ExerciseCounts> = exercise_ids
        .iter()
        .map(|id| (id.clone(), ExerciseCounts::default()))
        .collect();
    if exercise_ids.is_empty() {
        return Ok(result);
    }

    let tx = conn.unchecked_transaction()?;
    for chunk in exercise_ids.chunks(chunk_size.max(1)) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        for table in CHILD_TABLES {
            let mut stmt = tx.prepare(&format!(
                "SELECT exercise_id, COUNT(*) FROM {} WHERE exercise_id IN ({}) GROUP BY exercise_id",
                table, placeholders
            ))?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (exercise_id, count) in rows {
                if let Some(counts) = result.get_mut(&exercise_id) {
                    counts.set(table, count);
                }
            }
        }
    }
    tx.finish()?;

    Ok(result)
}
