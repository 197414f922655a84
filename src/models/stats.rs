use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time read of the offline resolution counters
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Requests served from the personal table
    pub personal_hits: u64,
    /// Cold-start requests served from the default table
    pub default_fallbacks: u64,
    /// When the counters were read
    pub captured_at: DateTime<Utc>,
}
