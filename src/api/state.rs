use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, AppResult, LoadError};
use crate::models::RecKind;
use crate::services::BlendingEngine;
use crate::stores::{EventStore, RecommendationStore, SimilarItemStore};

/// Bounds on the requested result length
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub default_k: usize,
    pub max_k: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            default_k: 10,
            max_k: 1000,
        }
    }
}

impl RequestLimits {
    /// The effective `k` for a request, rejecting values above `max_k`
    pub fn resolve_k(&self, requested: Option<usize>) -> AppResult<usize> {
        let k = requested.unwrap_or(self.default_k);
        if k > self.max_k {
            return Err(AppError::InvalidInput(format!(
                "k must be at most {}, got {}",
                self.max_k, k
            )));
        }
        Ok(k)
    }
}

/// Shared application state
///
/// Holds immutable handles to the loaded stores; cloning is cheap and no
/// request ever takes a lock.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BlendingEngine>,
    pub recommendations: Arc<RecommendationStore>,
    pub limits: RequestLimits,
}

impl AppState {
    /// Freezes fully loaded stores into shared state
    pub fn new(
        recommendations: RecommendationStore,
        events: EventStore,
        similar: SimilarItemStore,
        limits: RequestLimits,
    ) -> Self {
        let recommendations = Arc::new(recommendations);
        let engine = BlendingEngine::new(
            recommendations.clone(),
            Arc::new(events),
            Arc::new(similar),
        );

        Self {
            engine: Arc::new(engine),
            recommendations,
            limits,
        }
    }

    /// Loads every data source named in the config
    ///
    /// Performs blocking file I/O; any failure aborts startup.
    pub fn load(config: &Config) -> Result<Self, LoadError> {
        let mut events = EventStore::new(config.max_events_per_user);
        events.load(&config.events_path)?;

        let mut similar = SimilarItemStore::new();
        similar.load(&config.similar_items_path)?;

        let mut recommendations = RecommendationStore::new();
        recommendations.load(RecKind::Personal, &config.personal_recs_path)?;
        recommendations.load(RecKind::Default, &config.default_recs_path)?;

        let limits = RequestLimits {
            default_k: config.default_k,
            max_k: config.max_k,
        };

        Ok(Self::new(recommendations, events, similar, limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_k_defaults_and_bounds() {
        let limits = RequestLimits::default();

        assert_eq!(limits.resolve_k(None).unwrap(), 10);
        assert_eq!(limits.resolve_k(Some(0)).unwrap(), 0);
        assert_eq!(limits.resolve_k(Some(1000)).unwrap(), 1000);
        assert!(matches!(
            limits.resolve_k(Some(1001)),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_fails_on_missing_source() {
        let config: Config = envy::from_iter(vec![(
            "EVENTS_PATH".to_string(),
            "/nonexistent/events.csv".to_string(),
        )])
        .unwrap();

        assert!(matches!(AppState::load(&config), Err(LoadError::Io { .. })));
    }
}
