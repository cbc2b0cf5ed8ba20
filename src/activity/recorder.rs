use rusqlite::Connection;

use super::bus::ActivityBus;
use super::feed::{self, FeedEntry};
use crate::db::models::ActivityKind;
use crate::store::activities::{self, NewActivity};

/// Human-readable line stored with each activity.
pub fn describe(kind: ActivityKind, actor_name: &str, exercise_title: &str) -> String {
    match kind {
        ActivityKind::ExerciseCreated => {
            format!("{} created exercise \"{}\"", actor_name, exercise_title)
        }
        ActivityKind::CommentAdded => format!("{} commented on \"{}\"", actor_name, exercise_title),
        ActivityKind::SolutionAdded => {
            format!("{} posted a solution to \"{}\"", actor_name, exercise_title)
        }
        ActivityKind::ExerciseSaved => format!("{} saved \"{}\"", actor_name, exercise_title),
    }
}

/// Append an activity for a mutation that has already been committed, then
/// push the enriched entry to live observers.
///
/// Never fails the caller: an error at either step is logged and the
/// triggering mutation stands. Returns the published entry, if any.
pub fn record(conn: &Connection, bus: &ActivityBus, new: NewActivity) -> Option<FeedEntry> {
    let activity = match activities::append(conn, &new) {
        Ok(activity) => activity,
        Err(e) => {
            tracing::warn!(
                "Failed to record {} activity for {}: {}",
                new.kind.as_str(),
                new.actor_id,
                e
            );
            return None;
        }
    };

    match feed::entry(conn, &activity.id) {
        Ok(Some(entry)) => {
            let observers = bus.publish(entry.clone());
            tracing::debug!(
                "Published {} activity {} to {} observers",
                activity.kind.as_str(),
                activity.id,
                observers
            );
            Some(entry)
        }
        Ok(None) => {
            tracing::warn!("Recorded activity {} vanished before fan-out", activity.id);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to resolve activity {} for fan-out: {}", activity.id, e);
            None
        }
    }
}
