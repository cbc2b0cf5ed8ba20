//! Comments and solutions on an exercise.

use crate::activity::{self, describe};
use crate::attachments;
use crate::db::models::ContributionKind;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Submission};
use crate::state::AppState;
use crate::store::activities::NewActivity;
use crate::store::{contributions, exercises};
use crate::views::{self, ContributionView, MySolutionView};

/// Add a comment or solution. Needs text, at least one file, or both.
pub async fn contribute(
    state: &AppState,
    user: &CurrentUser,
    kind: ContributionKind,
    exercise_id: &str,
    submission: Submission,
) -> AppResult<ContributionView> {
    let text = submission.text("text").unwrap_or_default().to_string();
    if text.is_empty() && submission.files.is_empty() {
        return Err(AppError::bad_request(format!(
            "{} must have text or files",
            kind.label()
        )));
    }

    let title = {
        let conn = state.db.get()?;
        exercises::get(&conn, exercise_id)?.title
    };

    let stored = attachments::store_all(state.attachments.as_ref(), submission.files).await?;

    let inserted = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| {
            contributions::insert(&conn, kind, exercise_id, &user.id, &text, &stored)
        });
    let contribution = match inserted {
        Ok(contribution) => contribution,
        Err(e) => {
            attachments::discard(state.attachments.as_ref(), &stored).await;
            return Err(e);
        }
    };

    let conn = state.db.get()?;
    tracing::info!(
        "User {} added {} {} to exercise {}",
        user.id,
        kind.table(),
        contribution.id,
        exercise_id
    );

    let (comment_id, solution_id) = match kind {
        ContributionKind::Comment => (Some(contribution.id.clone()), None),
        ContributionKind::Solution => (None, Some(contribution.id.clone())),
    };
    activity::record(
        &conn,
        &state.activity_bus,
        NewActivity {
            kind: kind.activity_kind(),
            actor_id: user.id.clone(),
            exercise_id: Some(exercise_id.to_string()),
            comment_id,
            solution_id,
            message: describe(kind.activity_kind(), &user.name, &title),
        },
    );

    Ok(views::contribution_by(user, contribution))
}

/// Newest first, each with its author. 404 if the exercise is gone.
pub fn list(
    state: &AppState,
    kind: ContributionKind,
    exercise_id: &str,
) -> AppResult<Vec<ContributionView>> {
    let conn = state.db.get()?;
    if !exercises::exists(&conn, exercise_id)? {
        return Err(AppError::not_found("Exercise"));
    }
    let rows = contributions::list_for_exercise(&conn, kind, exercise_id)?;
    views::contribution_views(&conn, rows)
}

/// The caller's solutions, newest first, each with the exercise it answers.
pub fn my_solutions(state: &AppState, user: &CurrentUser) -> AppResult<Vec<MySolutionView>> {
    let conn = state.db.get()?;
    let solutions = contributions::list_by_author(&conn, ContributionKind::Solution, &user.id)?;

    let mut ids: Vec<String> = solutions.iter().map(|s| s.exercise_id.clone()).collect();
    ids.sort();
    ids.dedup();
    let found = exercises::find_many(&conn, &ids)?;

    views::my_solution_views(&conn, solutions, found)
}
