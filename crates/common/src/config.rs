use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::RelayError;

/// Default config file, overridden by `RELAY_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// YouTube Data API v3 base URL.
pub const DEFAULT_FEED_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page size the activities endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Global application configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub secrets: SecretsConfig,

    pub postgres: PostgresConfig,

    /// Identity the webhook posts as
    pub profile: Profile,

    #[serde(default)]
    pub feed: FeedConfig,

    /// Channel subscriptions, processed in this order
    pub notifications: Vec<Subscription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    /// YouTube Data API key
    #[serde(default)]
    pub developer_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    #[serde(default)]
    pub password: String,

    pub dbname: String,

    /// Maximum number of pooled connections (default: 1, the run is sequential)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub nickname: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,

    /// How far back the "published after" cutoff reaches (default: 3 days)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Page size for activity listing (1..=50, default: 50)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_base_url(),
            lookback_days: default_lookback_days(),
            max_results: default_max_results(),
        }
    }
}

/// One channel whose uploads are relayed to one webhook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub channel_id: String,
    pub webhook_url: String,
}

fn default_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    1
}

fn default_feed_base_url() -> String {
    DEFAULT_FEED_BASE_URL.to_string()
}

fn default_lookback_days() -> u32 {
    3
}

fn default_max_results() -> u32 {
    MAX_PAGE_SIZE
}

impl AppConfig {
    /// Load configuration from the file named by `RELAY_CONFIG` (or `config.toml`).
    ///
    /// A `.env` file is read first. `YOUTUBE_API_KEY` and `POSTGRES_PASSWORD`
    /// override the corresponding file values when set.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;

        let mut config: AppConfig =
            toml::from_str(&content).with_context(|| format!("Cannot parse {}", path.display()))?;

        config.apply_overrides(
            std::env::var("YOUTUBE_API_KEY").ok(),
            std::env::var("POSTGRES_PASSWORD").ok(),
        );
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            subscriptions = config.notifications.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate a TOML document without consulting the environment.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, api_key: Option<String>, password: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.secrets.developer_key = key;
        }
        if let Some(password) = password {
            self.postgres.password = password;
        }
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.secrets.developer_key.trim().is_empty() {
            return Err(RelayError::Config(
                "secrets.developer_key (or YOUTUBE_API_KEY) is required".to_string(),
            ));
        }
        if self.notifications.is_empty() {
            return Err(RelayError::Config(
                "at least one [[notifications]] entry is required".to_string(),
            ));
        }
        if self.feed.max_results == 0 || self.feed.max_results > MAX_PAGE_SIZE {
            return Err(RelayError::Config(format!(
                "feed.max_results must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        for (index, sub) in self.notifications.iter().enumerate() {
            if sub.channel_id.trim().is_empty() {
                return Err(RelayError::Config(format!(
                    "notifications[{}] ({}) has an empty channel_id",
                    index, sub.name
                )));
            }
            if sub.webhook_url.trim().is_empty() {
                return Err(RelayError::Config(format!(
                    "notifications[{}] ({}) has an empty webhook_url",
                    index, sub.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [secrets]
        developer_key = "AIza-test"

        [postgres]
        host = "localhost"
        username = "relay"
        password = "relay"
        dbname = "relay"

        [profile]
        nickname = "Upload Bot"
        avatar_url = "https://example.com/avatar.png"

        [[notifications]]
        name = "First"
        channel_id = "UC_first"
        webhook_url = "https://discord.com/api/webhooks/1/a"

        [[notifications]]
        name = "Second"
        channel_id = "UC_second"
        webhook_url = "https://discord.com/api/webhooks/2/b"
    "#;

    #[test]
    fn test_parse_sample_with_defaults() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.postgres.port, 5432);
        assert_eq!(config.postgres.max_connections, 1);
        assert_eq!(config.feed.base_url, DEFAULT_FEED_BASE_URL);
        assert_eq!(config.feed.lookback_days, 3);
        assert_eq!(config.feed.max_results, 50);
        assert_eq!(config.profile.nickname, "Upload Bot");
    }

    #[test]
    fn test_notifications_keep_file_order() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let ids: Vec<&str> = config
            .notifications
            .iter()
            .map(|n| n.channel_id.as_str())
            .collect();
        assert_eq!(ids, vec!["UC_first", "UC_second"]);
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let doc = SAMPLE.replace("developer_key = \"AIza-test\"", "");
        let err = AppConfig::from_toml(&doc).unwrap_err();
        assert!(err.to_string().contains("developer_key"));
    }

    #[test]
    fn test_env_override_supplies_api_key() {
        let doc = SAMPLE.replace("developer_key = \"AIza-test\"", "");
        let mut config: AppConfig = toml::from_str(&doc).unwrap();
        config.apply_overrides(Some("AIza-env".to_string()), Some("pw".to_string()));
        assert!(config.validate().is_ok());
        assert_eq!(config.secrets.developer_key, "AIza-env");
        assert_eq!(config.postgres.password, "pw");
    }

    #[test]
    fn test_empty_override_keeps_file_key() {
        let mut config: AppConfig = toml::from_str(SAMPLE).unwrap();
        config.apply_overrides(Some(String::new()), None);
        assert_eq!(config.secrets.developer_key, "AIza-test");
        assert_eq!(config.postgres.password, "relay");
    }

    #[test]
    fn test_empty_channel_id_rejected() {
        let doc = SAMPLE.replace("channel_id = \"UC_second\"", "channel_id = \"\"");
        let err = AppConfig::from_toml(&doc).unwrap_err();
        assert!(err.to_string().contains("notifications[1]"));
    }

    #[test]
    fn test_page_size_out_of_range_rejected() {
        let doc = format!("{}\n[feed]\nmax_results = 51\n", SAMPLE);
        assert!(AppConfig::from_toml(&doc).is_err());
    }
}
