use crate::config::ApiConfig;
use crate::errors::LookupError;
use async_trait::async_trait;
use http::header::{ACCEPT, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// The third-party API that knows about accounts and their posts.
///
/// Responses are passed through as opaque JSON documents.
#[async_trait]
pub trait LookupApi: Send + Sync {
    /// Profile of `username`, including its `secUid`.
    async fn check_user(&self, username: &str) -> Result<Value, LookupError>;

    /// One page of posts for the account identified by `sec_uid`.
    async fn posts(&self, sec_uid: &str, cursor: Option<&str>) -> Result<Value, LookupError>;

    async fn search(&self, category: &str, query: &str) -> Result<Value, LookupError>;

    /// Trending posts.
    async fn explore(&self) -> Result<Value, LookupError>;

    async fn video(&self, id: &str) -> Result<Value, LookupError>;
}

pub struct TikApiClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: HeaderValue,
    country: String,
    page_size: String,
    trending_count: String,
}

impl TikApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, LookupError> {
        let mut api_key = HeaderValue::from_str(&config.resolve_api_key()?)?;
        api_key.set_sensitive(true);

        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            country: config.country.clone(),
            page_size: config.page_size.to_string(),
            trending_count: config.trending_count.to_string(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, LookupError> {
        let url = self.base_url.join(path)?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, path, "could not read lookup API error body");
                "<unreadable body>".to_string()
            });
            tracing::warn!(%status, path, body = %body, "lookup API error");
            return Err(LookupError::UpstreamStatus { status, body });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl LookupApi for TikApiClient {
    async fn check_user(&self, username: &str) -> Result<Value, LookupError> {
        self.get_json(
            "check",
            &[("username", username), ("country", self.country.as_str())],
        )
        .await
    }

    async fn posts(&self, sec_uid: &str, cursor: Option<&str>) -> Result<Value, LookupError> {
        let mut query = vec![
            ("secUid", sec_uid),
            ("count", self.page_size.as_str()),
            ("country", self.country.as_str()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }
        self.get_json("posts", &query).await
    }

    async fn search(&self, category: &str, query: &str) -> Result<Value, LookupError> {
        self.get_json(&format!("search/{category}"), &[("query", query)])
            .await
    }

    async fn explore(&self) -> Result<Value, LookupError> {
        self.get_json(
            "explore",
            &[
                ("count", self.trending_count.as_str()),
                ("country", self.country.as_str()),
            ],
        )
        .await
    }

    async fn video(&self, id: &str) -> Result<Value, LookupError> {
        self.get_json("video", &[("id", id), ("country", self.country.as_str())])
            .await
    }
}
