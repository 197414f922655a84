//! Read-only, memory-resident data stores
//!
//! Every store is built once at startup (`new` followed by one or more `load`
//! calls), then frozen behind an `Arc` and shared across requests without
//! locking. Lookups report their outcome as a [`Lookup`] and each store's
//! `resolve` turns that into a degraded-but-valid list, so no request-path
//! operation returns an error.

use crate::models::{TrackId, UserId};

pub mod events;
pub mod loader;
pub mod recommendations;
pub mod similar_items;

pub use events::{Event, EventStore, DEFAULT_MAX_EVENTS_PER_USER};
pub use recommendations::{RecommendationStore, RequestStats};
pub use similar_items::SimilarItemStore;

/// Outcome of a keyed lookup into one of the store tables
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The key is indexed
    Found(T),
    /// The key is absent; an expected coverage gap
    NotFound,
    /// The table needed to answer is in an unusable state
    Malformed(&'static str),
}

/// Source of precomputed recommendations for a user
#[cfg_attr(test, mockall::automock)]
pub trait OfflineSource: Send + Sync {
    /// Up to `k` tracks for the user, in ranking order
    fn offline(&self, user_id: UserId, k: usize) -> Vec<TrackId>;
}

/// Source of a user's recent interactions
#[cfg_attr(test, mockall::automock)]
pub trait RecentEvents: Send + Sync {
    /// Up to `k` tracks, most recent first
    fn recent_tracks(&self, user_id: UserId, k: usize) -> Vec<TrackId>;
}

/// Source of item-to-item similarity
#[cfg_attr(test, mockall::automock)]
pub trait SimilarTracks: Send + Sync {
    /// Up to `k` tracks similar to `track_id`, best first
    fn similar_tracks(&self, track_id: TrackId, k: usize) -> Vec<TrackId>;
}
