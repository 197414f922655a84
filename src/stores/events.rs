use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::loader::{group_by_key, head, read_rows};
use super::{Lookup, RecentEvents};
use crate::error::LoadError;
use crate::models::{TrackId, UserId};

pub const DEFAULT_MAX_EVENTS_PER_USER: usize = 10;

#[derive(Debug, Deserialize)]
struct EventRow {
    user_id: UserId,
    track_id: TrackId,
    track_seq: i64,
}

/// One historical interaction; higher `track_seq` is more recent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub track_id: TrackId,
    pub track_seq: i64,
}

/// Per-user interaction history
///
/// Each user's events are kept newest first and capped at
/// `max_events_per_user`, so only the most recent window is retained.
#[derive(Debug)]
pub struct EventStore {
    events: Option<HashMap<UserId, Vec<Event>>>,
    max_events_per_user: usize,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVENTS_PER_USER)
    }
}

impl EventStore {
    pub fn new(max_events_per_user: usize) -> Self {
        Self {
            events: None,
            max_events_per_user,
        }
    }

    /// Loads history from a CSV file with `user_id`, `track_id` and
    /// `track_seq` columns
    pub fn load(&mut self, path: &Path) -> Result<usize, LoadError> {
        tracing::info!(
            path = %path.display(),
            max_events_per_user = self.max_events_per_user,
            "Loading previous events"
        );

        let rows: Vec<EventRow> = read_rows(path, &["user_id", "track_id", "track_seq"])?;
        let count = rows.len();

        let index = group_by_key(rows.into_iter().map(|row| {
            (
                row.user_id,
                Event {
                    track_id: row.track_id,
                    track_seq: row.track_seq,
                },
            )
        }));
        for (user_id, events) in index {
            self.insert_history(user_id, events);
        }

        tracing::info!(rows = count, users = self.users(), "Loaded events");
        Ok(count)
    }

    /// Adds events to a user's history, re-sorting and re-applying the cap
    pub fn insert_history(&mut self, user_id: UserId, events: Vec<Event>) {
        let max = self.max_events_per_user;
        let history = self
            .events
            .get_or_insert_with(HashMap::new)
            .entry(user_id)
            .or_default();

        history.extend(events);
        // stable: equal sequence numbers keep file order
        history.sort_by(|a, b| b.track_seq.cmp(&a.track_seq));
        history.truncate(max);
    }

    pub fn users(&self) -> usize {
        self.events.as_ref().map_or(0, HashMap::len)
    }

    /// The user's retained history, most recent first
    pub fn lookup(&self, user_id: UserId) -> Lookup<&[Event]> {
        match &self.events {
            Some(table) => match table.get(&user_id) {
                Some(history) => Lookup::Found(history.as_slice()),
                None => Lookup::NotFound,
            },
            None => Lookup::Malformed("events not loaded"),
        }
    }

    /// The user's `k` most recent tracks; empty when there is no history
    pub fn resolve(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        match self.lookup(user_id) {
            Lookup::Found(history) => head(history, k).iter().map(|e| e.track_id).collect(),
            Lookup::NotFound => Vec::new(),
            Lookup::Malformed(reason) => {
                tracing::warn!(user_id = %user_id, reason, "Events unavailable");
                Vec::new()
            }
        }
    }
}

impl RecentEvents for EventStore {
    fn recent_tracks(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        self.resolve(user_id, k)
    }
}
