use crate::cache::ProfileCache;
use crate::client::LookupApi;
use crate::config::Config;
use crate::errors::LookupError;
use crate::metrics_defs::REQUEST_DURATION;
use crate::relay_links::{add_relay_link, add_relay_links};
use crate::session::{new_session, session_from_headers, set_cookie_header};
use crate::video_id::extract_video_id;
use http::header::{ALLOW, HeaderValue, SET_COOKIE};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{Value, json};
use shared::histogram;
use shared::http::{json_response, make_error_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

pub type LookupBody = BoxBody<Bytes, LookupError>;

type JsonResult = Result<Response<Full<Bytes>>, LookupError>;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Endpoint {
    View,
    Search,
    TrendingPosts,
    Download,
    VideoDownload,
}

impl Endpoint {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/api/view" => Some(Endpoint::View),
            "/api/search" => Some(Endpoint::Search),
            "/api/trendingposts" => Some(Endpoint::TrendingPosts),
            "/api/download" => Some(Endpoint::Download),
            "/api/videodownload" => Some(Endpoint::VideoDownload),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Endpoint::View => "view",
            Endpoint::Search => "search",
            Endpoint::TrendingPosts => "trendingposts",
            Endpoint::Download => "download",
            Endpoint::VideoDownload => "videodownload",
        }
    }
}

/// Decoded query string. Empty values count as missing.
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn parse(query: Option<&str>) -> Self {
        let pairs = url::form_urlencoded::parse(query.unwrap_or("").as_bytes())
            .into_owned()
            .collect();
        QueryParams(pairs)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Account, search and trending lookups, answered as JSON.
#[derive(Clone)]
pub struct LookupService {
    api: Arc<dyn LookupApi>,
    cache: Option<Arc<ProfileCache>>,
    relay_path: Arc<str>,
}

impl LookupService {
    pub fn new(api: Arc<dyn LookupApi>, config: &Config) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(ProfileCache::new(&config.cache)));

        Self {
            api,
            cache,
            relay_path: config.relay_path.as_str().into(),
        }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<LookupBody> {
        let Some(endpoint) = Endpoint::from_path(req.uri().path()) else {
            return boxed(make_error_response(StatusCode::NOT_FOUND));
        };
        if req.method() != Method::GET {
            let mut response = boxed(make_error_response(StatusCode::METHOD_NOT_ALLOWED));
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            return response;
        }

        let params = QueryParams::parse(req.uri().query());
        let session = session_from_headers(req.headers());
        drop(req);

        let start = Instant::now();
        let result = match endpoint {
            Endpoint::View => self.view(&params, session).await,
            Endpoint::Search => self.search(&params).await,
            Endpoint::TrendingPosts => self.trending_posts().await,
            Endpoint::Download => Ok(download(&params)),
            Endpoint::VideoDownload => Ok(self.video_download(&params).await),
        };

        let response = result.unwrap_or_else(|e| error_response(endpoint, &e));
        histogram!(
            REQUEST_DURATION,
            "endpoint" => endpoint.as_str(),
            "status" => response.status().as_u16().to_string()
        )
        .record(start.elapsed().as_secs_f64());
        boxed(response)
    }

    async fn view(&self, params: &QueryParams, session: Option<String>) -> JsonResult {
        let Some(username) = params.get("username") else {
            return Ok(bad_request("Missing username"));
        };
        let cursor = params.get("cursor");

        let (session, issued) = match session {
            Some(session) => (session, false),
            None => (new_session(), true),
        };

        // Only the first page is cached
        let data = match (&self.cache, cursor) {
            (Some(cache), None) => match cache.get(&session, username) {
                Some(data) => data,
                None => {
                    let data = Arc::new(self.profile_page(username, None).await?);
                    cache.insert(&session, username, data.clone());
                    data
                }
            },
            _ => Arc::new(self.profile_page(username, cursor).await?),
        };

        let mut response = json_response(
            StatusCode::OK,
            &json!({ "success": true, "data": data.as_ref() }),
        );
        if issued {
            response
                .headers_mut()
                .insert(SET_COOKIE, set_cookie_header(&session)?);
        }
        Ok(response)
    }

    async fn profile_page(
        &self,
        username: &str,
        cursor: Option<&str>,
    ) -> Result<Value, LookupError> {
        let author_data = self.api.check_user(username).await?;
        let sec_uid = author_data
            .pointer("/userInfo/user/secUid")
            .and_then(Value::as_str)
            .filter(|sec_uid| !sec_uid.is_empty())
            .ok_or(LookupError::MissingSecUid)?;

        let mut author_post_data = self.api.posts(sec_uid, cursor).await?;
        let linked = add_relay_links(&mut author_post_data, &self.relay_path);
        tracing::debug!(username, linked, "fetched profile page");

        let next_cursor = author_post_data.get("cursor").cloned().unwrap_or(Value::Null);
        Ok(json!({
            "authorData": author_data,
            "authorPostData": author_post_data,
            "nextCursor": next_cursor,
        }))
    }

    async fn search(&self, params: &QueryParams) -> JsonResult {
        let (Some(category), Some(query)) = (params.get("category"), params.get("query")) else {
            return Ok(bad_request(
                "Missing required query parameters (category or query)",
            ));
        };
        if !is_valid_category(category) {
            return Ok(bad_request("Invalid search category"));
        }

        let data = self.api.search(category, query).await?;
        Ok(success(data))
    }

    async fn trending_posts(&self) -> JsonResult {
        let mut data = self.api.explore().await?;
        add_relay_links(&mut data, &self.relay_path);
        Ok(success(data))
    }

    async fn video_download(&self, params: &QueryParams) -> Response<Full<Bytes>> {
        let id = match video_id_param(params) {
            Ok(id) => id,
            Err(response) => return response,
        };

        match self.api.video(id).await {
            Ok(mut data) => {
                if let Some(item) = data.pointer_mut("/itemInfo/itemStruct") {
                    add_relay_link(item, &self.relay_path);
                }
                json_response(StatusCode::OK, &json!({ "status": 200, "data": data }))
            }
            Err(e) => {
                tracing::warn!(error = %e, video_id = id, "video lookup failed");
                status_message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong on api response",
                )
            }
        }
    }
}

impl Service<Request<Incoming>> for LookupService {
    type Response = Response<LookupBody>;
    type Error = LookupError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

fn download(params: &QueryParams) -> Response<Full<Bytes>> {
    match video_id_param(params) {
        Ok(id) => json_response(
            StatusCode::OK,
            &json!({
                "status": 200,
                "message": "Video ID extracted successfully",
                "videoId": id,
            }),
        ),
        Err(response) => response,
    }
}

fn video_id_param(params: &QueryParams) -> Result<&str, Response<Full<Bytes>>> {
    let Some(video_url) = params.get("videourl") else {
        return Err(status_message(
            StatusCode::BAD_REQUEST,
            "videourl query parameter is missing",
        ));
    };
    extract_video_id(video_url).ok_or_else(|| {
        status_message(
            StatusCode::NOT_FOUND,
            "Video ID not found in the provided URL",
        )
    })
}

fn is_valid_category(category: &str) -> bool {
    category
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn success(data: Value) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &json!({ "success": true, "data": data }))
}

fn bad_request(message: &str) -> Response<Full<Bytes>> {
    json_response(StatusCode::BAD_REQUEST, &json!({ "error": message }))
}

// The download endpoints repeat the status inside the body
fn status_message(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &json!({ "status": status.as_u16(), "message": message }),
    )
}

fn error_response(endpoint: Endpoint, err: &LookupError) -> Response<Full<Bytes>> {
    match err {
        LookupError::UpstreamStatus { status, .. } => {
            tracing::warn!(endpoint = endpoint.as_str(), %status, "lookup API refused request");
            json_response(*status, &json!({ "error": err.to_string() }))
        }
        LookupError::MissingSecUid => {
            tracing::warn!(endpoint = endpoint.as_str(), "profile without secUid");
            bad_request(&err.to_string())
        }
        _ => {
            tracing::error!(endpoint = endpoint.as_str(), error = %err, "lookup failed");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "error": "An unexpected error occurred" }),
            )
        }
    }
}

fn boxed(response: Response<Full<Bytes>>) -> Response<LookupBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
