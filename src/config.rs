use crate::domain::payment::PublishableKey;
use crate::domain::stream::{DEFAULT_CHANNEL, DEFAULT_FEED_LIMIT, DEFAULT_ITEM_TEMPLATE};
use crate::error::{ClientError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Values the page embeds for the client: processor key, stream URL, CSRF token,
/// plus the tunables for the coupon check and the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub publishable_key: Option<String>,
    pub stream_public_url: Option<String>,
    pub csrf_token: String,
    pub debounce_ms: u64,
    pub feed_limit: usize,
    pub channel: String,
    pub item_template: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            publishable_key: None,
            stream_public_url: None,
            csrf_token: String::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            feed_limit: DEFAULT_FEED_LIMIT,
            channel: DEFAULT_CHANNEL.to_string(),
            item_template: DEFAULT_ITEM_TEMPLATE.to_string(),
        }
    }
}

impl PageConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed_limit == 0 {
            return Err(ClientError::ConfigError(
                "feed_limit must be > 0".to_string(),
            ));
        }
        if self.channel.trim().is_empty() {
            return Err(ClientError::ConfigError(
                "channel must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn publishable_key(&self) -> Option<PublishableKey> {
        PublishableKey::parse(self.publishable_key.as_deref())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
