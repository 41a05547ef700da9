use crate::config::Config;
use crate::errors::RelayError;
use crate::media_ref::SignedMediaRef;
use crate::metrics_defs::{BYTES_RELAYED, UPSTREAM_RANGE_RETRIES};
use crate::upstream::UpstreamClient;
use bytes::Bytes;
use futures_util::StreamExt;
use http::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::ext::ReasonPhrase;
use shared::counter;

/// Body of a relay response: either the upstream media stream or a small JSON error.
pub type RelayBody = UnsyncBoxBody<Bytes, RelayError>;

/// Reissues signed media references against the CDN.
///
/// Holds no per-request state, so one instance serves every request.
pub struct Relay {
    upstream: UpstreamClient,
}

impl Relay {
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let upstream = UpstreamClient::new(&config.upstream, &config.forward_proxy)?;
        Ok(Self { upstream })
    }

    /// Fetches the media behind `media_ref` and returns the successful upstream
    /// response with its body still unread.
    ///
    /// A ranged request answered with 416 is retried once without the range.
    /// Any other non-2xx answer becomes `RelayError::UpstreamStatus`.
    pub async fn relay(
        &self,
        media_ref: &SignedMediaRef,
        range: Option<&HeaderValue>,
        cookie: Option<&HeaderValue>,
    ) -> Result<reqwest::Response, RelayError> {
        let url = self.upstream.media_url(media_ref);
        let empty_cookie = HeaderValue::from_static("");
        let cookie = cookie.unwrap_or(&empty_cookie);

        tracing::debug!(
            item_id = %media_ref.item_id,
            video_id = %media_ref.video_id,
            ranged = range.is_some(),
            "relaying media"
        );

        let mut response = self.upstream.fetch(&url, cookie, range).await?;

        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE && range.is_some() {
            tracing::info!(
                range = ?range,
                "416 received, retrying without Range header"
            );
            counter!(UPSTREAM_RANGE_RETRIES).increment(1);
            response = self.upstream.fetch(&url, cookie, None).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status,
                reason: reason_phrase(&response),
            });
        }

        Ok(response)
    }
}

// hyper only records the phrase when it differs from the canonical one
fn reason_phrase(response: &reqwest::Response) -> String {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .or_else(|| response.status().canonical_reason())
        .unwrap_or("unknown status")
        .to_string()
}

/// Turns a successful upstream response into the client response.
///
/// The body is forwarded one chunk at a time. Dropping the returned body drops
/// the upstream response, which closes the upstream connection.
pub fn stream_response(upstream: reqwest::Response) -> Result<Response<RelayBody>, RelayError> {
    let mut builder = Response::builder()
        .status(upstream.status())
        .header(CONTENT_TYPE, HeaderValue::from_static("video/mp4"))
        .header(ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    for name in [CONTENT_RANGE, CONTENT_LENGTH] {
        if let Some(value) = upstream.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }

    let frames = upstream.bytes_stream().map(|chunk| match chunk {
        Ok(bytes) => {
            counter!(BYTES_RELAYED).increment(bytes.len() as u64);
            Ok(Frame::data(bytes))
        }
        Err(e) => {
            tracing::warn!(error = %e, "upstream body stream failed");
            Err(RelayError::BodyStream(e))
        }
    });

    Ok(builder.body(StreamBody::new(frames).boxed_unsync())?)
}
