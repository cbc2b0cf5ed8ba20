use crate::activity::{self, describe};
use crate::attachments;
use crate::db::models::{ActivityKind, Difficulty};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Submission};
use crate::state::AppState;
use crate::store::activities::NewActivity;
use crate::store::exercises::{self, CascadeReport, NewExercise};
use crate::views::{self, ExerciseView};

use super::ensure_owner;

fn parse_difficulty(raw: &str) -> AppResult<Difficulty> {
    raw.parse::<Difficulty>().map_err(|_| {
        AppError::bad_request("Difficulty must be Beginner, Intermediate or Advanced")
    })
}

fn new_exercise(submission: &Submission) -> AppResult<NewExercise> {
    let (Some(title), Some(description), Some(subject), Some(difficulty)) = (
        submission.text("title"),
        submission.text("description"),
        submission.text("subject"),
        submission.text("difficulty"),
    ) else {
        return Err(AppError::bad_request(
            "Title, description, subject and difficulty are required",
        ));
    };

    Ok(NewExercise {
        title: title.to_string(),
        description: description.to_string(),
        subject: subject.to_string(),
        difficulty: parse_difficulty(difficulty)?,
        tags: submission.list("tags"),
    })
}

/// Create an exercise owned by `user`, then log `exercise_created`.
pub async fn create(
    state: &AppState,
    user: &CurrentUser,
    submission: Submission,
) -> AppResult<ExerciseView> {
    let input = new_exercise(&submission)?;
    let stored = attachments::store_all(state.attachments.as_ref(), submission.files).await?;

    let inserted = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| exercises::insert(&conn, &user.id, &input, &stored));
    let exercise = match inserted {
        Ok(exercise) => exercise,
        Err(e) => {
            attachments::discard(state.attachments.as_ref(), &stored).await;
            return Err(e);
        }
    };

    let conn = state.db.get()?;
    tracing::info!("User {} created exercise {}", user.id, exercise.id);

    activity::record(
        &conn,
        &state.activity_bus,
        NewActivity {
            kind: ActivityKind::ExerciseCreated,
            actor_id: user.id.clone(),
            exercise_id: Some(exercise.id.clone()),
            comment_id: None,
            solution_id: None,
            message: describe(ActivityKind::ExerciseCreated, &user.name, &exercise.title),
        },
    );

    views::exercise_view(&conn, exercise)
}

/// All exercises newest first, or only those created by `created_by`.
pub fn list(state: &AppState, created_by: Option<&str>) -> AppResult<Vec<ExerciseView>> {
    let conn = state.db.get()?;
    let found = exercises::list(&conn, created_by)?;
    views::exercise_views(&conn, found)
}

pub fn get(state: &AppState, id: &str) -> AppResult<ExerciseView> {
    let conn = state.db.get()?;
    let exercise = exercises::get(&conn, id)?;
    views::exercise_view(&conn, exercise)
}

/// Partial update by the owner. Uploaded files replace the attachment list
/// wholesale; `clearAttachments` empties it.
pub async fn update(
    state: &AppState,
    user: &CurrentUser,
    id: &str,
    submission: Submission,
) -> AppResult<ExerciseView> {
    let mut exercise = {
        let conn = state.db.get()?;
        exercises::get(&conn, id)?
    };
    ensure_owner(user, &exercise.created_by)?;

    if let Some(title) = submission.text("title") {
        exercise.title = title.to_string();
    }
    if let Some(description) = submission.text("description") {
        exercise.description = description.to_string();
    }
    if let Some(subject) = submission.text("subject") {
        exercise.subject = subject.to_string();
    }
    if let Some(difficulty) = submission.text("difficulty") {
        exercise.difficulty = parse_difficulty(difficulty)?;
    }
    if submission.has("tags") {
        exercise.tags = submission.list("tags");
    }
    let clear = submission.flag("clearAttachments");

    let mut fresh = Vec::new();
    if !submission.files.is_empty() {
        fresh = attachments::store_all(state.attachments.as_ref(), submission.files).await?;
        exercise.attachments = fresh.clone();
    } else if clear {
        exercise.attachments.clear();
    }

    let updated = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| exercises::update(&conn, &mut exercise));
    if let Err(e) = updated {
        attachments::discard(state.attachments.as_ref(), &fresh).await;
        return Err(e);
    }

    let conn = state.db.get()?;
    tracing::info!("User {} updated exercise {}", user.id, exercise.id);

    views::exercise_view(&conn, exercise)
}

/// Owner-only delete, cascading to comments, solutions and saves.
pub fn delete(state: &AppState, user: &CurrentUser, id: &str) -> AppResult<CascadeReport> {
    let mut conn = state.db.get()?;
    let exercise = exercises::get(&conn, id)?;
    ensure_owner(user, &exercise.created_by)?;

    let report = exercises::delete_cascade(&mut conn, id)?;
    tracing::info!(
        "User {} deleted exercise {} ({} comments, {} solutions, {} saves)",
        user.id,
        id,
        report.comments,
        report.solutions,
        report.saves
    );
    Ok(report)
}
