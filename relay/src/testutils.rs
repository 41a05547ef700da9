use crate::config::{Config, ForwardProxyConfig, UpstreamConfig};
use bytes::Bytes;
use http::{HeaderMap, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use shared::config::Listener;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

pub type FakeBody = UnsyncBoxBody<Bytes, Infallible>;

pub const CDN_MEDIA_URL: &str = "http://cdn.test/aweme/v1/play/";

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Stands in for the forward proxy and the CDN behind it.
///
/// Every request is recorded, then answered by `responder`, which also gets
/// the 1-based attempt number.
pub struct FakeProxy {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeProxy {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest, usize) -> Response<FakeBody> + Send + Sync + 'static,
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
                        let attempt = {
                            let mut all = recorded.lock().unwrap();
                            all.push(request.clone());
                            all.len()
                        };
                        let response = responder(&request, attempt);
                        async move { Ok::<_, Infallible>(response) }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        FakeProxy { addr, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn test_config(proxy_addr: SocketAddr) -> Config {
    Config {
        listener: Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        },
        admin_listener: Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        },
        upstream: UpstreamConfig {
            media_url: Url::parse(CDN_MEDIA_URL).unwrap(),
            response_timeout_secs: 5,
            ..Default::default()
        },
        forward_proxy: ForwardProxyConfig {
            url: Url::parse(&format!("http://{proxy_addr}")).unwrap(),
            username: Some("relay".into()),
            password: Some("secret".into()),
        },
    }
}
