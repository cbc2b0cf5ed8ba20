//! Response shapes. Every view that carries an exercise also carries its
//! derived counts.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::counts::{self, ExerciseCounts};
use crate::db::models::{Attachment, Contribution, Difficulty, Exercise, SavedExercise, User};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::store::users;

/// Public profile fields of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

impl From<&CurrentUser> for UserSummary {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub created_by: UserSummary,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub counts: ExerciseCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionView {
    pub id: String,
    pub exercise_id: String,
    pub author: UserSummary,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedExerciseView {
    pub id: String,
    pub saved_at: String,
    pub exercise: ExerciseView,
}

/// One of the caller's solutions together with the exercise it answers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MySolutionView {
    pub id: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: String,
    pub exercise: ExerciseView,
}

/// Resolves user ids to summaries, each at most once per response.
struct People<'c> {
    conn: &'c Connection,
    seen: HashMap<String, UserSummary>,
}

impl<'c> People<'c> {
    fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            seen: HashMap::new(),
        }
    }

    fn get(&mut self, id: &str) -> AppResult<UserSummary> {
        if let Some(summary) = self.seen.get(id) {
            return Ok(summary.clone());
        }
        let user = users::find_by_id(self.conn, id)?.ok_or_else(|| AppError::not_found("User"))?;
        let summary = UserSummary::from(user);
        self.seen.insert(id.to_string(), summary.clone());
        Ok(summary)
    }
}

fn exercise_with(
    exercise: Exercise,
    created_by: UserSummary,
    counts: ExerciseCounts,
) -> ExerciseView {
    ExerciseView {
        id: exercise.id,
        title: exercise.title,
        description: exercise.description,
        subject: exercise.subject,
        difficulty: exercise.difficulty,
        tags: exercise.tags,
        attachments: exercise.attachments,
        created_by,
        created_at: exercise.created_at,
        updated_at: exercise.updated_at,
        counts,
    }
}

pub fn exercise_view(conn: &Connection, exercise: Exercise) -> AppResult<ExerciseView> {
    let counts = counts::counts_for(conn, &exercise.id)?;
    let created_by = People::new(conn).get(&exercise.created_by)?;
    Ok(exercise_with(exercise, created_by, counts))
}

/// Views for a page of exercises, with counts fetched in one batch.
pub fn exercise_views(conn: &Connection, exercises: Vec<Exercise>) -> AppResult<Vec<ExerciseView>> {
    let ids: Vec<String> = exercises.iter().map(|e| e.id.clone()).collect();
    let counts = counts::counts_for_many(conn, &ids)?;
    let mut people = People::new(conn);

    exercises
        .into_iter()
        .map(|exercise| {
            let created_by = people.get(&exercise.created_by)?;
            let c = counts.get(&exercise.id).copied().unwrap_or_default();
            Ok(exercise_with(exercise, created_by, c))
        })
        .collect()
}

pub fn contribution_views(
    conn: &Connection,
    contributions: Vec<Contribution>,
) -> AppResult<Vec<ContributionView>> {
    let mut people = People::new(conn);
    contributions
        .into_iter()
        .map(|c| {
            Ok(ContributionView {
                author: people.get(&c.author_id)?,
                id: c.id,
                exercise_id: c.exercise_id,
                text: c.text,
                attachments: c.attachments,
                created_at: c.created_at,
            })
        })
        .collect()
}

/// A contribution just written by `author`; no lookup needed.
pub fn contribution_by(author: &CurrentUser, c: Contribution) -> ContributionView {
    ContributionView {
        id: c.id,
        exercise_id: c.exercise_id,
        author: UserSummary::from(author),
        text: c.text,
        attachments: c.attachments,
        created_at: c.created_at,
    }
}

/// Pairs each saved row with its exercise. Rows whose exercise has vanished
/// in the meantime are skipped.
pub fn saved_views(
    conn: &Connection,
    saved: Vec<SavedExercise>,
    exercises: Vec<Exercise>,
) -> AppResult<Vec<SavedExerciseView>> {
    let mut by_id: HashMap<String, ExerciseView> = exercise_views(conn, exercises)?
        .into_iter()
        .map(|view| (view.id.clone(), view))
        .collect();

    Ok(saved
        .into_iter()
        .filter_map(|row| {
            by_id.remove(&row.exercise_id).map(|exercise| SavedExerciseView {
                id: row.id,
                saved_at: row.created_at,
                exercise,
            })
        })
        .collect())
}

pub fn my_solution_views(
    conn: &Connection,
    solutions: Vec<Contribution>,
    exercises: Vec<Exercise>,
) -> AppResult<Vec<MySolutionView>> {
    let by_id: HashMap<String, ExerciseView> = exercise_views(conn, exercises)?
        .into_iter()
        .map(|view| (view.id.clone(), view))
        .collect();

    Ok(solutions
        .into_iter()
        .filter_map(|s| {
            by_id.get(&s.exercise_id).map(|exercise| MySolutionView {
                id: s.id,
                text: s.text,
                attachments: s.attachments,
                created_at: s.created_at,
                exercise: exercise.clone(),
            })
        })
        .collect())
}
