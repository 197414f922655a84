use std::path::PathBuf;

use serde::Deserialize;

use crate::stores::DEFAULT_MAX_EVENTS_PER_USER;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Personal recommendations (`user_id`, `track_id`, `score`)
    #[serde(default = "default_personal_recs_path")]
    pub personal_recs_path: PathBuf,

    /// Top popular tracks (`track_id`, `score`)
    #[serde(default = "default_default_recs_path")]
    pub default_recs_path: PathBuf,

    /// Similar items (`track_id`, `track_id_recommended`, `score`)
    #[serde(default = "default_similar_items_path")]
    pub similar_items_path: PathBuf,

    /// Event history (`user_id`, `track_id`, `track_seq`)
    #[serde(default = "default_events_path")]
    pub events_path: PathBuf,

    /// Events retained per user
    #[serde(default = "default_max_events_per_user")]
    pub max_events_per_user: usize,

    /// Result length when a request omits `k`
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Largest `k` a request may ask for
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_personal_recs_path() -> PathBuf {
    PathBuf::from("data/personal_recommendations.csv")
}

fn default_default_recs_path() -> PathBuf {
    PathBuf::from("data/top_popular.csv")
}

fn default_similar_items_path() -> PathBuf {
    PathBuf::from("data/similar_items.csv")
}

fn default_events_path() -> PathBuf {
    PathBuf::from("data/events.csv")
}

fn default_max_events_per_user() -> usize {
    DEFAULT_MAX_EVENTS_PER_USER
}

fn default_k() -> usize {
    10
}

fn default_max_k() -> usize {
    1000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.default_k, 10);
        assert_eq!(config.max_events_per_user, 10);
        assert_eq!(config.events_path, PathBuf::from("data/events.csv"));
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_overrides_from_environment() {
        let vars = vec![
            ("PORT".to_string(), "9000".to_string()),
            ("MAX_EVENTS_PER_USER".to_string(), "25".to_string()),
            ("SIMILAR_ITEMS_PATH".to_string(), "/srv/similar.csv".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.max_events_per_user, 25);
        assert_eq!(config.similar_items_path, PathBuf::from("/srv/similar.csv"));
    }
}
