use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::commands::{discussion, exercises, saves};
use crate::db::models::ContributionKind;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Submission};
use crate::state::AppState;
use crate::views::{ContributionView, ExerciseView, MySolutionView, SavedExerciseView};

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/exercises", get(list_exercises).post(create_exercise))
        .route("/api/exercises/mine", get(my_exercises))
        .route("/api/exercises/saved", get(my_saved))
        .route(
            "/api/exercises/{id}",
            get(get_exercise).put(update_exercise).delete(delete_exercise),
        )
        .route("/api/exercises/{id}/save-toggle", post(toggle_save))
        .route("/api/exercises/{id}/is-saved", get(is_saved))
        .route(
            "/api/exercises/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/api/exercises/{id}/solutions",
            get(list_solutions).post(create_solution),
        )
        .route("/api/solutions/mine", get(my_solutions))
}

// --- Exercises ---

async fn create_exercise(
    State(state): State<AppState>,
    user: CurrentUser,
    submission: Submission,
) -> AppResult<Response> {
    let view = exercises::create(&state, &user, submission).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

async fn list_exercises(State(state): State<AppState>) -> AppResult<Json<Vec<ExerciseView>>> {
    Ok(Json(exercises::list(&state, None)?))
}

async fn my_exercises(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<ExerciseView>>> {
    Ok(Json(exercises::list(&state, Some(&user.id))?))
}

async fn get_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ExerciseView>> {
    Ok(Json(exercises::get(&state, &id)?))
}

async fn update_exercise(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    submission: Submission,
) -> AppResult<Json<ExerciseView>> {
    Ok(Json(exercises::update(&state, &user, &id, submission).await?))
}

async fn delete_exercise(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    exercises::delete(&state, &user, &id)?;
    Ok((StatusCode::OK, Json(json!({ "message": "Exercise deleted" }))).into_response())
}

// --- Saves ---

async fn toggle_save(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<saves::SaveState>> {
    Ok(Json(saves::toggle(&state, &user, &id)?))
}

async fn is_saved(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let saved = saves::is_saved(&state, &user, &id)?;
    Ok(Json(json!({ "saved": saved })))
}

async fn my_saved(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<SavedExerciseView>>> {
    Ok(Json(saves::my_saved(&state, &user)?))
}

// --- Comments & solutions ---

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<ContributionView>>> {
    Ok(Json(discussion::list(&state, ContributionKind::Comment, &id)?))
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    submission: Submission,
) -> AppResult<Response> {
    let view =
        discussion::contribute(&state, &user, ContributionKind::Comment, &id, submission).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

async fn list_solutions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<ContributionView>>> {
    Ok(Json(discussion::list(&state, ContributionKind::Solution, &id)?))
}

async fn create_solution(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    submission: Submission,
) -> AppResult<Response> {
    let view =
        discussion::contribute(&state, &user, ContributionKind::Solution, &id, submission).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

async fn my_solutions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<MySolutionView>>> {
    Ok(Json(discussion::my_solutions(&state, &user)?))
}
