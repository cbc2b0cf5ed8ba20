use serde::Serialize;

use crate::activity::{self, describe};
use crate::counts;
use crate::db::models::ActivityKind;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::store::activities::NewActivity;
use crate::store::{exercises, saves};
use crate::views::{self, SavedExerciseView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub saved: bool,
    pub saves_count: i64,
}

/// Flip the caller's bookmark on an exercise and report the new state.
///
/// When `activity.record_saves` is on, turning a save on logs
/// `exercise_saved`; turning it off never logs anything.
pub fn toggle(state: &AppState, user: &CurrentUser, exercise_id: &str) -> AppResult<SaveState> {
    let mut conn = state.db.get()?;
    let exercise = exercises::get(&conn, exercise_id)?;

    let saved = saves::toggle(&mut conn, &user.id, exercise_id)?;
    tracing::info!(
        "User {} {} exercise {}",
        user.id,
        if saved { "saved" } else { "unsaved" },
        exercise_id
    );

    if saved && state.config.activity.record_saves {
        activity::record(
            &conn,
            &state.activity_bus,
            NewActivity {
                kind: ActivityKind::ExerciseSaved,
                actor_id: user.id.clone(),
                exercise_id: Some(exercise.id.clone()),
                comment_id: None,
                solution_id: None,
                message: describe(ActivityKind::ExerciseSaved, &user.name, &exercise.title),
            },
        );
    }

    Ok(SaveState {
        saved,
        saves_count: counts::counts_for(&conn, exercise_id)?.saves,
    })
}

pub fn is_saved(state: &AppState, user: &CurrentUser, exercise_id: &str) -> AppResult<bool> {
    let conn = state.db.get()?;
    saves::is_saved(&conn, &user.id, exercise_id)
}

/// The caller's bookmarks, most recently saved first.
pub fn my_saved(state: &AppState, user: &CurrentUser) -> AppResult<Vec<SavedExerciseView>> {
    let conn = state.db.get()?;
    let rows = saves::list_for_user(&conn, &user.id)?;
    let ids: Vec<String> = rows.iter().map(|r| r.exercise_id.clone()).collect();
    let found = exercises::find_many(&conn, &ids)?;
    views::saved_views(&conn, rows, found)
}
