use std::collections::HashMap;

use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::attachments::{self, UploadedFile};
use crate::auth::session;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Extractor that requires authentication.
/// Accepts `Authorization: Bearer <token>` or the session cookie; 401 otherwise.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.auth.cookie_name)
            .ok_or(AppError::Unauthorized)?;

        let conn = state.db.get()?;
        let user = session::user_for_token(&conn, &token)?.ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser {
            id: user.id,
            name: user.name,
            email: user.email,
        })
    }
}

/// Optional user extractor. Yields None instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// The raw session token presented with a request, if any.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| cookie_value(headers, cookie_name).map(str::to_string))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

/// A decoded write request: text fields plus any uploaded files.
///
/// Accepts `multipart/form-data` (files arrive as `files` parts) or a JSON
/// object. Repeated form fields and JSON arrays become multi-valued fields.
#[derive(Debug, Default)]
pub struct Submission {
    fields: HashMap<String, Vec<String>>,
    pub files: Vec<UploadedFile>,
}

impl Submission {
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    /// First value of a field, trimmed; `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.text(name), Some("true") | Some("1") | Some("on"))
    }

    /// All values of a field, each also split on commas.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(|v| v.split(','))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }

    fn push_json(&mut self, name: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::String(s) => {
                self.fields
                    .entry(name.to_string())
                    .or_default()
                    .push(s.clone());
            }
            Value::Array(items) => {
                self.fields.entry(name.to_string()).or_default();
                for item in items {
                    self.push_json(name, item);
                }
            }
            other => {
                self.fields
                    .entry(name.to_string())
                    .or_default()
                    .push(other.to_string());
            }
        }
    }
}

impl FromRequest<AppState> for Submission {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        let mut submission = Submission::default();

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            while let Some(field) = multipart.next_field().await? {
                let name = field.name().unwrap_or_default().to_string();
                match field.file_name().map(str::to_string) {
                    Some(file_name) => {
                        let mime_type = field
                            .content_type()
                            .map(str::to_string)
                            .unwrap_or_else(|| {
                                mime_guess::from_path(&file_name)
                                    .first_or_octet_stream()
                                    .to_string()
                            });
                        let bytes = field.bytes().await?;
                        // Browsers send an empty part for an untouched file input
                        if file_name.is_empty() && bytes.is_empty() {
                            continue;
                        }
                        submission.files.push(UploadedFile {
                            original_name: file_name,
                            mime_type,
                            bytes,
                        });
                    }
                    None => {
                        let value = field.text().await?;
                        submission.fields.entry(name).or_default().push(value);
                    }
                }
            }
        } else {
            let Json(body) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            let Value::Object(map) = body else {
                return Err(AppError::bad_request("Expected a JSON object"));
            };
            for (name, value) in &map {
                submission.push_json(name, value);
            }
        }

        attachments::check_limits(&submission.files, &state.config.storage)?;
        Ok(submission)
    }
}
