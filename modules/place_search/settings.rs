use serde::Deserialize;

use crate::retry::Backoff;

/// `[search]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// API host, without trailing slash.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Suggestion path; also the signed prefix.
    #[serde(default = "default_path")]
    pub path: String,
    /// `filter` parameter.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Results per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Environment variable holding the API key.
    #[serde(default = "default_key_env")]
    pub key_env: String,
    /// Environment variable holding the signing secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            path: default_path(),
            filter: default_filter(),
            page_size: default_page_size(),
            timeout_ms: default_timeout_ms(),
            key_env: default_key_env(),
            secret_env: default_secret_env(),
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Attempts per page, first call included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between attempts.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Delay growth.
    #[serde(default)]
    pub backoff: Backoff,
    /// Upper bound for any single delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Pause after every page call.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            backoff: Backoff::default(),
            max_delay_ms: default_max_delay_ms(),
            pause_ms: default_pause_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "https://apis.map.qq.com".into()
}

fn default_path() -> String {
    "/ws/place/v1/suggestion".into()
}

fn default_filter() -> String {
    "category=大学".into()
}

const fn default_page_size() -> u32 {
    20
}

const fn default_timeout_ms() -> u64 {
    15_000
}

fn default_key_env() -> String {
    "TENCENT_MAP_KEY".into()
}

fn default_secret_env() -> String {
    "TENCENT_MAP_SK".into()
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_delay_ms() -> u64 {
    1_000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_pause_ms() -> u64 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Doc {
        #[serde(default)]
        search: SearchSettings,
        #[serde(default)]
        retry: RetrySettings,
    }

    #[test]
    fn missing_sections_take_defaults() {
        let doc: Doc = toml::from_str("").unwrap();
        assert_eq!(doc.search.page_size, 20);
        assert_eq!(doc.search.filter, "category=大学");
        assert_eq!(doc.retry.max_attempts, 10);
        assert_eq!(doc.retry.backoff, Backoff::Fixed);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let doc: Doc = toml::from_str(
            "[search]\npage_size = 10\n[retry]\nbackoff = \"exponential\"\ndelay_ms = 50\n",
        )
        .unwrap();
        assert_eq!(doc.search.page_size, 10);
        assert_eq!(doc.search.key_env, "TENCENT_MAP_KEY");
        assert_eq!(doc.retry.backoff, Backoff::Exponential);
        assert_eq!(doc.retry.delay_ms, 50);
        assert_eq!(doc.retry.pause_ms, 200);
    }
}
