use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::loader::{group_by_key, head, read_rows};
use super::{Lookup, SimilarTracks};
use crate::error::LoadError;
use crate::models::{ScoredTrack, TrackId};

#[derive(Debug, Deserialize)]
struct SimilarRow {
    track_id: TrackId,
    track_id_recommended: TrackId,
    score: f64,
}

/// Item-to-item similarity table
///
/// Each source track maps to its neighbours in descending score order, as
/// stored in the source file.
#[derive(Debug, Default)]
pub struct SimilarItemStore {
    similar: Option<HashMap<TrackId, Vec<ScoredTrack>>>,
}

impl SimilarItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the similarity table from a CSV file with `track_id`,
    /// `track_id_recommended` and `score` columns
    pub fn load(&mut self, path: &Path) -> Result<usize, LoadError> {
        tracing::info!(path = %path.display(), "Loading similar items");

        let rows: Vec<SimilarRow> =
            read_rows(path, &["track_id", "track_id_recommended", "score"])?;
        let count = rows.len();

        let index = group_by_key(rows.into_iter().map(|row| {
            (
                row.track_id,
                ScoredTrack {
                    track_id: row.track_id_recommended,
                    score: row.score,
                },
            )
        }));
        for (track_id, neighbours) in index {
            self.insert(track_id, neighbours);
        }

        tracing::info!(rows = count, tracks = self.len(), "Loaded similar items");
        Ok(count)
    }

    pub fn insert(&mut self, track_id: TrackId, neighbours: Vec<ScoredTrack>) {
        self.similar
            .get_or_insert_with(HashMap::new)
            .entry(track_id)
            .or_default()
            .extend(neighbours);
    }

    /// Number of source tracks with at least one neighbour
    pub fn len(&self) -> usize {
        self.similar.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, track_id: TrackId) -> Lookup<&[ScoredTrack]> {
        match &self.similar {
            Some(table) => match table.get(&track_id) {
                Some(neighbours) => Lookup::Found(neighbours.as_slice()),
                None => Lookup::NotFound,
            },
            None => Lookup::Malformed("similar items not loaded"),
        }
    }

    /// Up to `k` neighbours of `track_id` with their scores
    pub fn resolve_scored(&self, track_id: TrackId, k: usize) -> Vec<ScoredTrack> {
        match self.lookup(track_id) {
            Lookup::Found(neighbours) => head(neighbours, k).to_vec(),
            Lookup::NotFound => {
                tracing::debug!(track_id = %track_id, "No similar items for track");
                Vec::new()
            }
            Lookup::Malformed(reason) => {
                tracing::warn!(track_id = %track_id, reason, "Similar items unavailable");
                Vec::new()
            }
        }
    }

    /// Up to `k` tracks similar to `track_id`; empty for unknown tracks
    pub fn resolve(&self, track_id: TrackId, k: usize) -> Vec<TrackId> {
        self.resolve_scored(track_id, k)
            .into_iter()
            .map(|neighbour| neighbour.track_id)
            .collect()
    }
}

impl SimilarTracks for SimilarItemStore {
    fn similar_tracks(&self, track_id: TrackId, k: usize) -> Vec<TrackId> {
        self.resolve(track_id, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_store() -> SimilarItemStore {
        let mut store = SimilarItemStore::new();
        store.insert(
            TrackId(582507),
            vec![
                ScoredTrack { track_id: TrackId(41280596), score: 0.92 },
                ScoredTrack { track_id: TrackId(37849072), score: 0.81 },
                ScoredTrack { track_id: TrackId(57947608), score: 0.44 },
            ],
        );
        store
    }

    #[test]
    fn test_resolve_returns_top_k_in_stored_order() {
        let store = create_test_store();

        assert_eq!(
            store.resolve(TrackId(582507), 2),
            vec![TrackId(41280596), TrackId(37849072)]
        );
    }

    #[test]
    fn test_resolve_scored_keeps_scores() {
        let store = create_test_store();

        let scored = store.resolve_scored(TrackId(582507), 1);
        assert_eq!(scored, vec![ScoredTrack { track_id: TrackId(41280596), score: 0.92 }]);
    }

    #[test]
    fn test_unknown_track_is_empty_not_error() {
        let store = create_test_store();

        assert_eq!(store.lookup(TrackId(1)), Lookup::NotFound);
        assert!(store.resolve(TrackId(1), 10).is_empty());
    }

    #[test]
    fn test_unloaded_store_is_empty() {
        let store = SimilarItemStore::new();
        assert!(store.is_empty());
        assert!(store.resolve(TrackId(582507), 10).is_empty());
    }

    #[test]
    fn test_load_from_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "track_id,track_id_recommended,score").unwrap();
        writeln!(file, "1,11,0.9").unwrap();
        writeln!(file, "1,12,0.8").unwrap();
        writeln!(file, "2,21,0.7").unwrap();

        let mut store = SimilarItemStore::new();
        assert_eq!(store.load(file.path()).unwrap(), 3);

        assert_eq!(store.len(), 2);
        assert_eq!(store.resolve(TrackId(1), 10), vec![TrackId(11), TrackId(12)]);
        assert_eq!(store.resolve(TrackId(2), 10), vec![TrackId(21)]);
    }
}
