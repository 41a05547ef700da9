use crate::errors::RelayError;
use crate::media_ref::SignedMediaRef;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT, UPSTREAM_ERRORS};
use crate::relay::{Relay, RelayBody, stream_response};
use http::header::{ALLOW, COOKIE, HeaderValue, RANGE};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use shared::http::{json_response, make_error_response};
use shared::{counter, gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Path the relay answers on.
pub const RELAY_PATH: &str = "/api/video";

#[derive(Clone)]
pub struct RelayService {
    relay: Arc<Relay>,
}

impl RelayService {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<RelayBody> {
        if req.uri().path() != RELAY_PATH {
            return boxed(make_error_response(StatusCode::NOT_FOUND));
        }
        if req.method() != Method::GET {
            let mut response = boxed(make_error_response(StatusCode::METHOD_NOT_ALLOWED));
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            return response;
        }

        let media_ref = SignedMediaRef::from_query(req.uri().query().unwrap_or(""));
        let range = req.headers().get(RANGE).cloned();
        let cookie = req.headers().get(COOKIE).cloned();
        drop(req);

        let start = Instant::now();
        let inflight = InflightGuard::new();
        let result = match self
            .relay
            .relay(&media_ref, range.as_ref(), cookie.as_ref())
            .await
        {
            Ok(upstream) => stream_response(upstream),
            Err(e) => Err(e),
        };
        drop(inflight);

        let response = result.unwrap_or_else(|e| error_response(&e));
        histogram!(REQUEST_DURATION, "status" => response.status().as_u16().to_string())
            .record(start.elapsed().as_secs_f64());
        response
    }
}

impl Service<Request<Incoming>> for RelayService {
    type Response = Response<RelayBody>;
    type Error = RelayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

// Upstream status and reason are passed on; anything else is reported as a bare 500.
fn error_response(err: &RelayError) -> Response<RelayBody> {
    counter!(UPSTREAM_ERRORS, "kind" => err.kind()).increment(1);

    let (status, message) = match err {
        RelayError::UpstreamStatus { status, reason } => {
            tracing::warn!(%status, reason = %reason, "upstream refused media request");
            (*status, format!("Failed to fetch video: {reason}"))
        }
        _ => {
            tracing::error!(error = %err, "relay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        }
    };

    boxed(json_response(status, &json!({ "error": message })))
}

fn boxed(response: Response<Full<Bytes>>) -> Response<RelayBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed_unsync())
}

struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}
