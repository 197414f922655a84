use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod stats;

pub use stats::StatsSnapshot;

/// Opaque track identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

/// Opaque user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recommended track together with the score it was ranked by
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredTrack {
    pub track_id: TrackId,
    pub score: f64,
}

/// Which offline table a data source populates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecKind {
    /// Model-derived recommendations keyed by user
    Personal,
    /// Global popularity ranking served to cold-start users
    Default,
}

impl Display for RecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecKind::Personal => write!(f, "personal"),
            RecKind::Default => write!(f, "default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&vec![TrackId(10), TrackId(20)]).unwrap();
        assert_eq!(json, "[10,20]");
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(format!("{}", UserId(1179649)), "1179649");
    }

    #[test]
    fn test_rec_kind_display_and_serde() {
        assert_eq!(RecKind::Personal.to_string(), "personal");
        assert_eq!(RecKind::Default.to_string(), "default");

        let kind: RecKind = serde_json::from_str(r#""default""#).unwrap();
        assert_eq!(kind, RecKind::Default);
    }
}
