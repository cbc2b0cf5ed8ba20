use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/uploads/{id}", get(serve))
}

async fn serve(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let blob = state
        .attachments
        .open(&id)
        .await?
        .ok_or_else(|| AppError::not_found("File"))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, blob.mime_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        blob.bytes,
    )
        .into_response())
}
