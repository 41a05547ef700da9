use crate::client::LookupApi;
use crate::config::{ApiConfig, CacheConfig, Config};
use crate::errors::LookupError;
use async_trait::async_trait;
use http::{HeaderMap, StatusCode, Uri};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use shared::config::Listener;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn query(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.uri.query().unwrap_or("").as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// In-process stand-in for the lookup API, answering JSON.
pub struct FakeApi {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeApi {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (StatusCode, Value) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder = Arc::new(responder);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let io = TokioIo::new(stream);
                let recorded = recorded.clone();
                let responder = responder.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let request = RecordedRequest {
                            uri: req.uri().clone(),
                            headers: req.headers().clone(),
                        };
                        recorded.lock().unwrap().push(request.clone());
                        let (status, body) = responder(&request);

                        let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
                        *response.status_mut() = status;
                        async move { Ok::<_, Infallible>(response) }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        FakeApi { addr, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub const PLAY_URL: &str = "https://www.tiktok.com/aweme/v1/play/?faid=1988&file_id=f1&is_play_url=1&item_id=111&line=0&ply_type=2&signaturev3=sig&tk=tok&vidc=useast5&video_id=v111";

/// Canned `LookupApi` that counts calls.
#[derive(Default)]
pub struct MockApi {
    /// When set, every call fails with this status
    pub fail_with: Option<StatusCode>,
    /// Leave `secUid` out of the profile
    pub without_sec_uid: bool,
    pub check_user_calls: AtomicUsize,
    pub posts_calls: AtomicUsize,
    pub last_cursor: Mutex<Option<String>>,
}

impl MockApi {
    fn fail(&self) -> Result<(), LookupError> {
        match self.fail_with {
            Some(status) => Err(LookupError::UpstreamStatus {
                status,
                body: "upstream said no".into(),
            }),
            None => Ok(()),
        }
    }

    pub fn check_user_calls(&self) -> usize {
        self.check_user_calls.load(Ordering::SeqCst)
    }

    pub fn posts_calls(&self) -> usize {
        self.posts_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupApi for MockApi {
    async fn check_user(&self, username: &str) -> Result<Value, LookupError> {
        self.check_user_calls.fetch_add(1, Ordering::SeqCst);
        self.fail()?;
        if self.without_sec_uid {
            return Ok(json!({"userInfo": {"user": {"uniqueId": username}}}));
        }
        Ok(json!({"userInfo": {"user": {"uniqueId": username, "secUid": "SEC-1"}}}))
    }

    async fn posts(&self, sec_uid: &str, cursor: Option<&str>) -> Result<Value, LookupError> {
        self.posts_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_cursor.lock().unwrap() = cursor.map(str::to_string);
        self.fail()?;
        Ok(json!({
            "secUid": sec_uid,
            "cursor": "next-1",
            "itemList": [
                {"id": "111", "video": {"playAddr": PLAY_URL}},
                {"id": "222", "video": {"playAddr": "https://v16-webapp.tiktok.com/video/tos/abc"}},
            ],
        }))
    }

    async fn search(&self, category: &str, query: &str) -> Result<Value, LookupError> {
        self.fail()?;
        Ok(json!({"category": category, "query": query}))
    }

    async fn explore(&self) -> Result<Value, LookupError> {
        self.fail()?;
        Ok(json!({"itemList": [{"id": "111", "video": {"downloadAddr": PLAY_URL}}]}))
    }

    async fn video(&self, id: &str) -> Result<Value, LookupError> {
        self.fail()?;
        Ok(json!({"itemInfo": {"itemStruct": {"id": id, "video": {"playAddr": PLAY_URL}}}}))
    }
}

pub fn test_config() -> Config {
    Config {
        listener: Listener {
            host: "127.0.0.1".into(),
            port: 4000,
        },
        admin_listener: Listener {
            host: "127.0.0.1".into(),
            port: 4001,
        },
        api: ApiConfig {
            api_key: Some("test-key".into()),
            ..Default::default()
        },
        cache: CacheConfig::default(),
        relay_path: relay::RELAY_PATH.to_string(),
    }
}
