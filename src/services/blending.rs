use std::sync::Arc;

use crate::models::{TrackId, UserId};
use crate::stores::{OfflineSource, RecentEvents, SimilarTracks};

/// Combines offline and online recommendations into one response list
///
/// The offline half comes from precomputed per-user (or default) lists. The
/// online half takes the user's most recent track as a seed and looks up its
/// neighbours in the similarity table. Neither half can fail; the worst case
/// is an empty list.
#[derive(Clone)]
pub struct BlendingEngine {
    offline: Arc<dyn OfflineSource>,
    events: Arc<dyn RecentEvents>,
    similar: Arc<dyn SimilarTracks>,
}

impl BlendingEngine {
    pub fn new(
        offline: Arc<dyn OfflineSource>,
        events: Arc<dyn RecentEvents>,
        similar: Arc<dyn SimilarTracks>,
    ) -> Self {
        Self {
            offline,
            events,
            similar,
        }
    }

    /// Up to `k` precomputed recommendations
    pub fn offline(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        self.offline.offline(user_id, k)
    }

    /// Up to `k` tracks similar to the user's most recent one
    pub fn online(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        let recent = self.events.recent_tracks(user_id, k);

        match recent.first() {
            Some(&seed) => {
                let recs = self.similar.similar_tracks(seed, k);
                tracing::debug!(
                    user_id = %user_id,
                    seed = %seed,
                    returned = recs.len(),
                    "Resolved online recommendations"
                );
                recs
            }
            None => Vec::new(),
        }
    }

    /// Blended offline and online recommendations for the user
    pub fn recommend(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        let offline = self.offline(user_id, k);
        let online = self.online(user_id, k);
        let blended = blend(&offline, &online);

        tracing::info!(
            user_id = %user_id,
            k,
            offline = offline.len(),
            online = online.len(),
            blended = blended.len(),
            "Blended recommendations"
        );

        blended
    }
}

/// Interleaves two ranked lists by position parity
///
/// For each index `i` below the shorter length, even positions take
/// `offline[i]` and odd positions take `online[i]`. Whatever the longer list
/// holds past that length is appended; when the lengths are equal the offline
/// remainder (empty) is used. The entries skipped at each index are never
/// emitted, and duplicates across the lists are kept.
pub fn blend<T: Copy>(offline: &[T], online: &[T]) -> Vec<T> {
    let shared = offline.len().min(online.len());
    let mut blended = Vec::with_capacity(offline.len().max(online.len()));

    for i in 0..shared {
        if i % 2 == 0 {
            blended.push(offline[i]);
        } else {
            blended.push(online[i]);
        }
    }

    if offline.len() < online.len() {
        blended.extend_from_slice(&online[shared..]);
    } else {
        blended.extend_from_slice(&offline[shared..]);
    }

    blended
}
