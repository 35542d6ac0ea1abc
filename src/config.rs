//! Host-facing configuration for feed clients.
//!
//! These types carry no behaviour of their own; the owning process
//! deserialises them from its configuration source and hands them to
//! [`FeedClients`](crate::FeedClients).

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::client::DEFAULT_IDLE_TIMEOUT;

/// Connection settings for the inbound feed.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use feedclient::config::FeedClientConfig;
///
/// let cfg: FeedClientConfig =
///     serde_json::from_str(r#"{"urls": ["ws://127.0.0.1:9642"], "timeout": 30}"#).unwrap();
/// assert!(cfg.enabled());
/// assert_eq!(cfg.timeout, Duration::from_secs(30));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedClientConfig {
    /// Feed endpoints. The feed is disabled when the first entry is empty.
    pub urls: Vec<String>,
    /// Idle-read timeout applied to every connection, in whole seconds.
    #[serde(deserialize_with = "duration_from_secs")]
    pub timeout: Duration,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            urls: vec![String::new()],
            timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl FeedClientConfig {
    /// Whether a feed URL is configured.
    #[must_use]
    pub fn enabled(&self) -> bool { self.urls.first().is_some_and(|url| !url.is_empty()) }

    /// Non-empty URLs in configuration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.urls
            .iter()
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// Feed section of a host configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Inbound feed settings.
    pub input: FeedClientConfig,
}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_config_is_disabled() {
        let cfg = FeedClientConfig::default();
        assert!(!cfg.enabled());
        assert_eq!(cfg.urls, vec![String::new()]);
        assert_eq!(cfg.timeout, Duration::from_secs(20));
        assert_eq!(cfg.endpoints().count(), 0);
    }

    #[rstest]
    #[case(r#"{}"#, false)]
    #[case(r#"{"urls": []}"#, false)]
    #[case(r#"{"urls": [""]}"#, false)]
    #[case(r#"{"urls": ["", "ws://b"]}"#, false)]
    #[case(r#"{"urls": ["ws://a"]}"#, true)]
    fn enabled_follows_first_url(#[case] json: &str, #[case] expected: bool) {
        let cfg: FeedClientConfig = serde_json::from_str(json).expect("valid config");
        assert_eq!(cfg.enabled(), expected);
    }

    #[test]
    fn nested_config_fills_defaults() {
        let cfg: FeedConfig =
            serde_json::from_str(r#"{"input": {"urls": ["ws://a", "", "ws://b"]}}"#).expect("valid config");
        assert_eq!(cfg.input.timeout, DEFAULT_IDLE_TIMEOUT);
        assert_eq!(cfg.input.endpoints().collect::<Vec<_>>(), ["ws://a", "ws://b"]);
    }

    #[test]
    fn timeout_must_be_whole_seconds() {
        let res = serde_json::from_str::<FeedClientConfig>(r#"{"timeout": "20s"}"#);
        assert!(res.is_err());
    }
}
