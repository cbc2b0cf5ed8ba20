use rusqlite::{params, Connection, OptionalExtension, Row};

use super::is_unique_violation;
use crate::db;
use crate::db::models::User;
use crate::error::{AppError, AppResult};

const COLUMNS: &str = "id, name, email, password_hash, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Emails compare case-insensitively and ignore surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_taken() -> AppError {
    AppError::bad_request("Email already in use")
}

pub fn insert(conn: &Connection, name: &str, email: &str, password_hash: &str) -> AppResult<User> {
    let email = normalize_email(email);
    if find_by_email(conn, &email)?.is_some() {
        return Err(email_taken());
    }

    let user = User {
        id: db::new_id(),
        name: name.trim().to_string(),
        email,
        password_hash: password_hash.to_string(),
        created_at: db::now(),
    };

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.name,
            user.email,
            user.password_hash,
            user.created_at
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            email_taken()
        } else {
            e.into()
        }
    })?;

    Ok(user)
}

pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", COLUMNS),
            params![normalize_email(email)],
            from_row,
        )
        .optional()?;
    Ok(user)
}

/// Change display name and/or email. Email stays unique.
pub fn update_profile(
    conn: &Connection,
    id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> AppResult<User> {
    let mut user = find_by_id(conn, id)?.ok_or_else(|| AppError::not_found("User"))?;

    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        user.name = name.to_string();
    }
    if let Some(email) = email.map(normalize_email).filter(|e| !e.is_empty()) {
        if email != user.email {
            if let Some(other) = find_by_email(conn, &email)? {
                if other.id != user.id {
                    return Err(email_taken());
                }
            }
            user.email = email;
        }
    }

    conn.execute(
        "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3",
        params![user.name, user.email, user.id],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            email_taken()
        } else {
            e.into()
        }
    })?;

    Ok(user)
}
