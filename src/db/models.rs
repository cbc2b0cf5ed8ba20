use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Beginner" => Ok(Difficulty::Beginner),
            "Intermediate" => Ok(Difficulty::Intermediate),
            "Advanced" => Ok(Difficulty::Advanced),
            other => Err(ParseEnumError {
                kind: "difficulty",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ExerciseCreated,
    SolutionAdded,
    CommentAdded,
    ExerciseSaved,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::ExerciseCreated => "exercise_created",
            ActivityKind::SolutionAdded => "solution_added",
            ActivityKind::CommentAdded => "comment_added",
            ActivityKind::ExerciseSaved => "exercise_saved",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exercise_created" => Ok(ActivityKind::ExerciseCreated),
            "solution_added" => Ok(ActivityKind::SolutionAdded),
            "comment_added" => Ok(ActivityKind::CommentAdded),
            "exercise_saved" => Ok(ActivityKind::ExerciseSaved),
            other => Err(ParseEnumError {
                kind: "activity kind",
                value: other.to_string(),
            }),
        }
    }
}

// Both enums live in TEXT columns under their canonical names.
macro_rules! text_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_column!(Difficulty);
text_column!(ActivityKind);

/// Which of the two discussion tables a contribution lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionKind {
    Comment,
    Solution,
}

impl ContributionKind {
    pub fn table(&self) -> &'static str {
        match self {
            ContributionKind::Comment => "comments",
            ContributionKind::Solution => "solutions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContributionKind::Comment => "Comment",
            ContributionKind::Solution => "Solution",
        }
    }

    pub fn activity_kind(&self) -> ActivityKind {
        match self {
            ContributionKind::Comment => ActivityKind::CommentAdded,
            ContributionKind::Solution => ActivityKind::SolutionAdded,
        }
    }
}

/// Reference to a blob held by the attachment store. Stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub storage_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A comment or a solution; both share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: String,
    pub exercise_id: String,
    pub author_id: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedExercise {
    pub id: String,
    pub user_id: String,
    pub exercise_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub seq: i64,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub actor_id: String,
    pub exercise_id: Option<String>,
    pub comment_id: Option<String>,
    pub solution_id: Option<String>,
    pub message: String,
    pub created_at: String,
}
