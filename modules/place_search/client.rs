use std::{collections::BTreeMap, env, fmt, time::Duration};

use async_trait::async_trait;
use campus_core::RawPlace;
use md5::{Digest, Md5};
use reqwest::Client;
use serde::Deserialize;

use crate::{error::SearchError, settings::SearchSettings};

/// One page query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Search keyword, the institution name.
    pub keyword: String,
    /// 1-based page number.
    pub page_index: u32,
    /// Results per page.
    pub page_size: u32,
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Total hits across all pages.
    pub count: u64,
    /// Places on this page.
    pub places: Vec<RawPlace>,
}

/// Source of place-search pages.
#[async_trait]
pub trait PlaceSearchClient: Send + Sync {
    /// Fetches one page.
    async fn search(&self, request: &PageRequest) -> Result<SearchPage, SearchError>;
}

/// API key and signing secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Public key sent as `key`.
    pub key: String,
    /// Secret appended when signing; never sent.
    pub secret: String,
}

impl Credentials {
    /// Creates credentials from literal values.
    #[must_use]
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Reads the variables named in `settings`.
    ///
    /// # Errors
    ///
    /// [`SearchError::MissingCredential`] naming the first unset or empty
    /// variable.
    pub fn from_env(settings: &SearchSettings) -> Result<Self, SearchError> {
        let read = |name: &str| {
            env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| SearchError::MissingCredential(name.to_string()))
        };
        Ok(Self::new(read(&settings.key_env)?, read(&settings.secret_env)?))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// `md5_hex(path + "?" + k=v&... + secret)` over the unencoded values,
/// keys in ascending order.
#[must_use]
pub fn sign_request(path: &str, params: &BTreeMap<String, String>, secret: &str) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Md5::digest(format!("{path}?{query}{secret}").as_bytes()))
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    data: Vec<RawPlace>,
}

impl SuggestionResponse {
    fn into_page(self) -> Result<SearchPage, SearchError> {
        let message = self.message.unwrap_or_default();
        match self.status {
            Some(0) => Ok(SearchPage {
                count: self.count,
                places: self.data,
            }),
            Some(120) => Err(SearchError::RateLimited(message)),
            Some(121) => Err(SearchError::QuotaExhausted(message)),
            Some(status) => Err(SearchError::Api { status, message }),
            None => Err(SearchError::Decode("response has no status".into())),
        }
    }
}

/// Tencent Maps place-suggestion client.
#[derive(Debug, Clone)]
pub struct TencentPlaceClient {
    http: Client,
    settings: SearchSettings,
    credentials: Credentials,
}

impl TencentPlaceClient {
    /// Builds the HTTP client with the configured timeout.
    ///
    /// # Errors
    ///
    /// [`SearchError::Transport`] when the TLS backend cannot start.
    pub fn new(settings: SearchSettings, credentials: Credentials) -> Result<Self, SearchError> {
        let http = Client::builder()
            .user_agent("campus-atlas/0.1")
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            settings,
            credentials,
        })
    }

    /// Request parameters before signing.
    #[must_use]
    pub fn params(&self, request: &PageRequest) -> BTreeMap<String, String> {
        [
            ("keyword", request.keyword.clone()),
            ("key", self.credentials.key.clone()),
            ("filter", self.settings.filter.clone()),
            ("get_ad", "1".to_string()),
            ("page_size", request.page_size.to_string()),
            ("page_index", request.page_index.to_string()),
            ("added_fields", "category_code".to_string()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }

    /// Parameters with `sig` appended last.
    #[must_use]
    pub fn signed_params(&self, request: &PageRequest) -> Vec<(String, String)> {
        let params = self.params(request);
        let sig = sign_request(&self.settings.path, &params, &self.credentials.secret);
        let mut query: Vec<_> = params.into_iter().collect();
        query.push(("sig".to_string(), sig));
        query
    }

    fn url(&self) -> String {
        format!(
            "{}{}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.path
        )
    }
}

#[async_trait]
impl PlaceSearchClient for TencentPlaceClient {
    async fn search(&self, request: &PageRequest) -> Result<SearchPage, SearchError> {
        let response = self
            .http
            .get(self.url())
            .query(&self.signed_params(request))
            .send()
            .await?;
        let body = response
            .error_for_status()?
            .json::<SuggestionResponse>()
            .await?;
        body.into_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> TencentPlaceClient {
        TencentPlaceClient::new(SearchSettings::default(), Credentials::new("KEY123", "SECRET")).unwrap()
    }

    fn request() -> PageRequest {
        PageRequest {
            keyword: "北京大学".into(),
            page_index: 1,
            page_size: 20,
        }
    }

    #[test]
    fn signature_matches_reference_vector() {
        let mut params = BTreeMap::new();
        params.insert("b".to_string(), "2".to_string());
        params.insert("a".to_string(), "1".to_string());
        assert_eq!(
            sign_request("/p", &params, "sk"),
            "1b54cb2b8dcf995c9378138b042ca517"
        );
    }

    #[test]
    fn signed_params_cover_every_field() {
        let query = client().signed_params(&request());
        let keys: Vec<_> = query.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "added_fields",
                "filter",
                "get_ad",
                "key",
                "keyword",
                "page_index",
                "page_size",
                "sig"
            ]
        );
        assert_eq!(query.last().unwrap().1, "1d15a6cae1fed36f37c8457801d3fb12");
    }

    #[test]
    fn status_codes_map_to_errors() {
        let parse = |value: serde_json::Value| {
            serde_json::from_value::<SuggestionResponse>(value)
                .unwrap()
                .into_page()
        };
        let ok = parse(json!({
            "status": 0,
            "count": 41,
            "data": [{ "id": "1", "title": "北京大学" }]
        }))
        .unwrap();
        assert_eq!(ok.count, 41);
        assert_eq!(ok.places.len(), 1);
        assert_eq!(
            parse(json!({ "status": 120, "message": "qps" })),
            Err(SearchError::RateLimited("qps".into()))
        );
        assert_eq!(
            parse(json!({ "status": 121, "message": "daily" })),
            Err(SearchError::QuotaExhausted("daily".into()))
        );
        assert!(matches!(
            parse(json!({ "status": 311, "message": "bad key" })),
            Err(SearchError::Api { status: 311, .. })
        ));
        assert!(matches!(parse(json!({})), Err(SearchError::Decode(_))));
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let rendered = format!("{:?}", Credentials::new("k", "very-secret"));
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn missing_env_is_reported_by_name() {
        let settings = SearchSettings {
            key_env: "CAMPUS_TEST_UNSET_KEY_7F3A".into(),
            ..SearchSettings::default()
        };
        assert_eq!(
            Credentials::from_env(&settings),
            Err(SearchError::MissingCredential("CAMPUS_TEST_UNSET_KEY_7F3A".into()))
        );
    }
}
