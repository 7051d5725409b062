//! API 客户端
//!
//! 每个请求自动附带会话中的 Bearer 令牌；
//! 任何响应为 401 时使会话失效（由路由服务监听并跳转到登录页）。

use crate::session::SessionStore;
use crate::web::{HttpClient, HttpError, HttpRequest, KeyValueStore};
use log::{debug, warn};
use sensordash_shared::HEADER_AUTHORIZATION;
use sensordash_shared::protocol::ApiRequest;
use std::sync::Arc;
use thiserror::Error;

const STATUS_UNAUTHORIZED: u16 = 401;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] HttpError),
    /// 服务端拒绝了当前凭据，会话已被清除
    #[error("credential rejected (401)")]
    Unauthorized,
    /// 登录响应中没有可用的令牌
    #[error("login response carried no token")]
    MissingToken,
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to encode request body: {0}")]
    Encode(serde_json::Error),
    #[error("failed to decode response body: {0}")]
    Decode(serde_json::Error),
}

pub struct ApiClient<C: HttpClient, S: KeyValueStore> {
    base_url: String,
    client: C,
    session: Arc<SessionStore<S>>,
}

impl<C: HttpClient, S: KeyValueStore> ApiClient<C, S> {
    pub fn new(base_url: impl Into<String>, client: C, session: Arc<SessionStore<S>>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore<S>> {
        &self.session
    }

    pub fn http_client(&self) -> &C {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发送一个类型化请求
    pub async fn send<R: ApiRequest>(&self, request: &R) -> Result<R::Response, ApiError> {
        let url = self.url(R::PATH);
        let mut req = HttpRequest::new(&url, R::METHOD).with_header("Content-Type", "application/json");

        if let Some(token) = self.session.token() {
            req = req.with_header(HEADER_AUTHORIZATION, &token.header_value());
        }

        if R::METHOD.has_body() {
            let body = serde_json::to_string(request).map_err(ApiError::Encode)?;
            req = req.with_body(body);
        }

        debug!("[Api] {} {}", R::METHOD.as_str(), url);
        let res = self.client.send(req).await?;

        if res.status == STATUS_UNAUTHORIZED {
            warn!("[Api] {} {} returned 401", R::METHOD.as_str(), url);
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }

        if !res.ok() {
            return Err(ApiError::Status {
                status: res.status,
                body: res.body,
            });
        }

        R::decode_response(&res.body).map_err(ApiError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{BearerToken, Session, SessionEvent};
    use crate::web::{MemoryStorage, MockHttpClient};
    use sensordash_shared::protocol::FetchPointsRequest;
    use sensordash_shared::{
        AnalysisSubmission, Identity, LoginRequest, STORAGE_IDENTITY_KEY, STORAGE_TOKEN_KEY,
    };
    use serde_json::json;
    use std::sync::Mutex;

    const BASE: &str = "https://api.test";

    fn points_body() -> serde_json::Value {
        json!({"points": [1.0, 2.0], "timestamp": "2024-01-01T00:00:00Z", "lineNumber": 7})
    }

    fn logged_in_client(storage: MemoryStorage) -> ApiClient<MockHttpClient, MemoryStorage> {
        let session = Arc::new(SessionStore::new(storage));
        session.establish(Session::new(
            Identity::new("ada@example.com", "Ada", "Lovelace"),
            BearerToken::new("abc").unwrap(),
        ));
        ApiClient::new(format!("{BASE}/"), MockHttpClient::new(), session)
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let api = logged_in_client(MemoryStorage::new());
        api.client.mock_response(&format!("{BASE}/points"), 200, points_body());

        let reading = api.send(&FetchPointsRequest).await.unwrap();
        assert_eq!(reading.line_number, 7);

        let req = api.client.last_request().unwrap();
        assert_eq!(req.url, "https://api.test/points");
        assert_eq!(req.headers.get("Authorization").map(String::as_str), Some("Bearer abc"));
        assert!(req.body.is_none());
    }

    #[tokio::test]
    async fn test_no_token_no_header() {
        let session = Arc::new(SessionStore::new(MemoryStorage::new()));
        let api = ApiClient::new(BASE, MockHttpClient::new(), session);
        api.client
            .mock_response(&format!("{BASE}/login"), 200, json!({"token": "abc"}));

        let req = LoginRequest::from(&Identity::new("a@b.co", "Al", "Bo"));
        let resp = api.send(&req).await.unwrap();
        assert_eq!(resp.token, "abc");

        let sent = api.client.last_request().unwrap();
        assert!(!sent.headers.contains_key("Authorization"));
        assert_eq!(
            sent.body.as_deref(),
            Some(r#"{"email":"a@b.co","firstName":"Al","lastName":"Bo"}"#)
        );
    }

    #[tokio::test]
    async fn test_unauthorized_from_any_endpoint_invalidates_session() {
        for path in ["/points", "/results"] {
            let storage = MemoryStorage::new();
            let api = logged_in_client(storage.clone());
            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = events.clone();
            api.session().subscribe(move |e| sink.lock().unwrap().push(e.clone()));
            api.client.mock_raw(&format!("{BASE}{path}"), 401, "");

            let result = if path == "/points" {
                api.send(&FetchPointsRequest).await.map(|_| ())
            } else {
                let submission = AnalysisSubmission {
                    plot: String::new(),
                    description: "Flat line with a spike".into(),
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                    email: "ada@example.com".into(),
                    line_number: 1,
                };
                api.send(&submission).await
            };

            assert!(matches!(result, Err(ApiError::Unauthorized)));
            assert!(!api.session().is_authenticated());
            assert!(!storage.contains(STORAGE_TOKEN_KEY));
            assert!(!storage.contains(STORAGE_IDENTITY_KEY));
            assert_eq!(*events.lock().unwrap(), vec![SessionEvent::Invalidated]);
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let api = logged_in_client(MemoryStorage::new());
        api.client.mock_raw(&format!("{BASE}/points"), 503, "maintenance");

        match api.send(&FetchPointsRequest).await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(api.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_transport_and_decode_errors() {
        let api = logged_in_client(MemoryStorage::new());
        assert!(matches!(
            api.send(&FetchPointsRequest).await,
            Err(ApiError::Transport(_))
        ));

        api.client.mock_raw(&format!("{BASE}/points"), 200, "{\"points\":");
        assert!(matches!(
            api.send(&FetchPointsRequest).await,
            Err(ApiError::Decode(_))
        ));
    }
}
