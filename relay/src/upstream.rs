use crate::config::{ForwardProxyConfig, UpstreamConfig, ValidationError};
use crate::errors::RelayError;
use crate::media_ref::SignedMediaRef;
use http::header::{ACCEPT, COOKIE, HeaderValue, RANGE, USER_AGENT};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// HTTP client for the media CDN. All traffic goes through the forward proxy.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    media_url: Url,
    user_agent: HeaderValue,
    response_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(
        upstream: &UpstreamConfig,
        forward_proxy: &ForwardProxyConfig,
    ) -> Result<Self, RelayError> {
        let mut proxy = reqwest::Proxy::all(forward_proxy.url.as_str())?;
        if let Some(username) = &forward_proxy.username {
            proxy = proxy.basic_auth(username, forward_proxy.password.as_deref().unwrap_or(""));
        }

        let user_agent = HeaderValue::from_str(&upstream.user_agent)
            .map_err(|_| ValidationError::InvalidUserAgent)?;

        let client = reqwest::Client::builder()
            .proxy(proxy)
            .connect_timeout(upstream.connect_timeout())
            .read_timeout(upstream.read_timeout())
            .build()?;

        Ok(Self {
            client,
            media_url: upstream.media_url.clone(),
            user_agent,
            response_timeout: upstream.response_timeout(),
        })
    }

    /// Media-play URL for `media_ref`. Any query on the configured endpoint is replaced.
    pub fn media_url(&self, media_ref: &SignedMediaRef) -> Url {
        let mut url = self.media_url.clone();
        url.set_query(Some(&media_ref.to_query_string()));
        url
    }

    /// Sends one GET and waits for the response headers. The body is left unread.
    pub async fn fetch(
        &self,
        url: &Url,
        cookie: &HeaderValue,
        range: Option<&HeaderValue>,
    ) -> Result<reqwest::Response, RelayError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .header(USER_AGENT, self.user_agent.clone())
            .header(COOKIE, cookie.clone());

        if let Some(range) = range {
            request = request.header(RANGE, range.clone());
        }

        let response = timeout(self.response_timeout, request.send())
            .await
            .map_err(|_| RelayError::UpstreamTimeout(self.response_timeout))??;

        Ok(response)
    }
}
