use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Deserialize;

use super::loader::{group_by_key, head, read_rows};
use super::{Lookup, OfflineSource};
use crate::error::LoadError;
use crate::models::{RecKind, ScoredTrack, StatsSnapshot, TrackId, UserId};

#[derive(Debug, Deserialize)]
struct PersonalRow {
    user_id: UserId,
    track_id: TrackId,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct PopularRow {
    track_id: TrackId,
    score: f64,
}

/// Process-wide counters of how offline requests were served
///
/// Shared by every request handler; increments are atomic so concurrent
/// requests never lose an update.
#[derive(Debug, Default)]
pub struct RequestStats {
    personal_hits: AtomicU64,
    default_fallbacks: AtomicU64,
}

impl RequestStats {
    fn record_personal_hit(&self) {
        self.personal_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_default_fallback(&self) {
        self.default_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            personal_hits: self.personal_hits.load(Ordering::Relaxed),
            default_fallbacks: self.default_fallbacks.load(Ordering::Relaxed),
            captured_at: Utc::now(),
        }
    }
}

/// Personal and default (top popular) recommendations
///
/// Users present in the personal table get their own list; everyone else
/// falls back to the global popularity ranking.
#[derive(Debug, Default)]
pub struct RecommendationStore {
    personal: Option<HashMap<UserId, Vec<ScoredTrack>>>,
    default: Option<Vec<ScoredTrack>>,
    stats: RequestStats,
}

impl RecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads one of the two offline tables from a CSV file
    ///
    /// Personal files need `user_id`, `track_id` and `score` columns; the
    /// default file needs `track_id` and `score`. Returns the number of rows
    /// read.
    pub fn load(&mut self, kind: RecKind, path: &Path) -> Result<usize, LoadError> {
        tracing::info!(kind = %kind, path = %path.display(), "Loading recommendations");

        let rows = match kind {
            RecKind::Personal => {
                let rows: Vec<PersonalRow> =
                    read_rows(path, &["user_id", "track_id", "score"])?;
                let count = rows.len();
                let index = group_by_key(rows.into_iter().map(|row| {
                    (
                        row.user_id,
                        ScoredTrack {
                            track_id: row.track_id,
                            score: row.score,
                        },
                    )
                }));
                for (user_id, recs) in index {
                    self.insert_personal(user_id, recs);
                }
                count
            }
            RecKind::Default => {
                let rows: Vec<PopularRow> = read_rows(path, &["track_id", "score"])?;
                let count = rows.len();
                self.set_default(
                    rows.into_iter()
                        .map(|row| ScoredTrack {
                            track_id: row.track_id,
                            score: row.score,
                        })
                        .collect(),
                );
                count
            }
        };

        tracing::info!(
            kind = %kind,
            rows,
            personal_users = self.personal_users(),
            default_len = self.default.as_ref().map_or(0, Vec::len),
            "Loaded recommendations"
        );

        Ok(rows)
    }

    /// Appends to a user's personal list, keeping the given order
    pub fn insert_personal(&mut self, user_id: UserId, recs: Vec<ScoredTrack>) {
        self.personal
            .get_or_insert_with(HashMap::new)
            .entry(user_id)
            .or_default()
            .extend(recs);
    }

    /// Replaces the default ranking
    pub fn set_default(&mut self, recs: Vec<ScoredTrack>) {
        self.default = Some(recs);
    }

    pub fn personal_users(&self) -> usize {
        self.personal.as_ref().map_or(0, HashMap::len)
    }

    /// Looks a user up in the personal table only
    pub fn lookup(&self, user_id: UserId) -> Lookup<&[ScoredTrack]> {
        match &self.personal {
            Some(table) => match table.get(&user_id) {
                Some(recs) => Lookup::Found(recs.as_slice()),
                None => Lookup::NotFound,
            },
            None => Lookup::Malformed("personal recommendations not loaded"),
        }
    }

    /// The default ranking served to cold-start users, if loaded
    pub fn fallback(&self) -> Option<&[ScoredTrack]> {
        self.default.as_deref()
    }

    /// Up to `k` recommendations for the user
    ///
    /// Personal list when the user has one, otherwise the default ranking.
    /// Each successful resolution bumps exactly one counter. An unusable table
    /// is logged and yields an empty list.
    pub fn resolve(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        let recs: &[ScoredTrack] = match self.lookup(user_id) {
            Lookup::Found(recs) => {
                self.stats.record_personal_hit();
                recs
            }
            Lookup::NotFound => match self.fallback() {
                Some(recs) => {
                    self.stats.record_default_fallback();
                    recs
                }
                None => {
                    tracing::error!(
                        user_id = %user_id,
                        reason = "default recommendations not loaded",
                        "No recommendations found"
                    );
                    return Vec::new();
                }
            },
            Lookup::Malformed(reason) => {
                tracing::error!(user_id = %user_id, reason, "No recommendations found");
                return Vec::new();
            }
        };

        let tracks: Vec<TrackId> = head(recs, k).iter().map(|rec| rec.track_id).collect();

        tracing::debug!(
            user_id = %user_id,
            k,
            returned = tracks.len(),
            "Resolved offline recommendations"
        );

        tracks
    }

    pub fn report_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Writes every counter to the log
    pub fn log_stats(&self) {
        let stats = self.report_stats();
        tracing::info!("Stats for recommendations");
        tracing::info!(value = stats.personal_hits, "personal_hits");
        tracing::info!(value = stats.default_fallbacks, "default_fallbacks");
    }
}

impl OfflineSource for RecommendationStore {
    fn offline(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        self.resolve(user_id, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn scored(ids: &[i64]) -> Vec<ScoredTrack> {
        ids.iter()
            .enumerate()
            .map(|(rank, &id)| ScoredTrack {
                track_id: TrackId(id),
                score: 1.0 - rank as f64 * 0.1,
            })
            .collect()
    }

    fn tracks(ids: &[i64]) -> Vec<TrackId> {
        ids.iter().copied().map(TrackId).collect()
    }

    fn create_test_store() -> RecommendationStore {
        let mut store = RecommendationStore::new();
        store.insert_personal(UserId(1), scored(&[10, 20, 30]));
        store.set_default(scored(&[1, 2, 3]));
        store
    }

    #[test]
    fn test_personal_user_gets_prefix_of_personal_list() {
        let store = create_test_store();

        assert_eq!(store.resolve(UserId(1), 2), tracks(&[10, 20]));

        let stats = store.report_stats();
        assert_eq!(stats.personal_hits, 1);
        assert_eq!(stats.default_fallbacks, 0);
    }

    #[test]
    fn test_short_list_is_not_padded() {
        let store = create_test_store();
        assert_eq!(store.resolve(UserId(1), 10), tracks(&[10, 20, 30]));
    }

    #[test]
    fn test_cold_start_user_falls_back_to_default() {
        let store = create_test_store();

        assert_eq!(store.resolve(UserId(1179649), 10), tracks(&[1, 2, 3]));

        let stats = store.report_stats();
        assert_eq!(stats.personal_hits, 0);
        assert_eq!(stats.default_fallbacks, 1);
    }

    #[test]
    fn test_missing_default_table_yields_empty_list() {
        let mut store = RecommendationStore::new();
        store.insert_personal(UserId(1), scored(&[10]));

        assert_eq!(store.lookup(UserId(2)), Lookup::NotFound);
        assert!(store.fallback().is_none());

        assert!(store.resolve(UserId(2), 10).is_empty());

        let stats = store.report_stats();
        assert_eq!(stats.personal_hits, 0);
        assert_eq!(stats.default_fallbacks, 0);
    }

    #[test]
    fn test_unloaded_store_yields_empty_list() {
        let store = RecommendationStore::new();

        assert_eq!(store.lookup(UserId(1)), Lookup::Malformed("personal recommendations not loaded"));
        assert!(store.resolve(UserId(1), 10).is_empty());
    }

    #[test]
    fn test_zero_k_still_counts_resolution() {
        let store = create_test_store();

        assert!(store.resolve(UserId(1), 0).is_empty());
        assert_eq!(store.report_stats().personal_hits, 1);
    }

    #[test]
    fn test_load_from_csv_keeps_file_order() {
        let mut personal = NamedTempFile::new().unwrap();
        writeln!(personal, "user_id,track_id,score").unwrap();
        writeln!(personal, "1,37615,0.9").unwrap();
        writeln!(personal, "2,555,0.8").unwrap();
        writeln!(personal, "1,38318,0.7").unwrap();
        writeln!(personal, "1,65011,0.5").unwrap();

        let mut popular = NamedTempFile::new().unwrap();
        writeln!(popular, "track_id,score").unwrap();
        writeln!(popular, "53404,100").unwrap();
        writeln!(popular, "33311009,90").unwrap();

        let mut store = RecommendationStore::new();
        assert_eq!(store.load(RecKind::Personal, personal.path()).unwrap(), 4);
        assert_eq!(store.load(RecKind::Default, popular.path()).unwrap(), 2);

        assert_eq!(store.personal_users(), 2);
        assert_eq!(store.resolve(UserId(1), 10), tracks(&[37615, 38318, 65011]));
        assert_eq!(store.resolve(UserId(3), 10), tracks(&[53404, 33311009]));
    }

    #[test]
    fn test_default_file_without_score_is_rejected() {
        let mut popular = NamedTempFile::new().unwrap();
        writeln!(popular, "track_id").unwrap();
        writeln!(popular, "53404").unwrap();

        let mut store = RecommendationStore::new();
        let err = store.load(RecKind::Default, popular.path()).unwrap_err();

        assert!(matches!(err, LoadError::MissingColumn { column: "score", .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolutions_are_all_counted() {
        let store = Arc::new(create_test_store());

        let mut tasks = Vec::new();
        for i in 0..200 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let user_id = if i % 2 == 0 { UserId(1) } else { UserId(2) };
                store.resolve(user_id, 3)
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stats = store.report_stats();
        assert_eq!(stats.personal_hits, 100);
        assert_eq!(stats.default_fallbacks, 100);
    }
}
