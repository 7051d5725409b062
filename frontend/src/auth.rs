//! 认证模块
//!
//! 把会话存储桥接到响应式系统：会话事件写入信号，
//! 路由服务只依赖派生出的 `is_authenticated` 信号。

use crate::api::{ApiClient, ApiError};
use crate::session::{BearerToken, Session, SessionEvent, SessionStore};
use crate::web::{FetchClient, HttpClient, KeyValueStore, LocalStorage};
use leptos::prelude::*;
use log::{info, warn};
use sensordash_shared::{Identity, LoginRequest};
use std::sync::Arc;

pub type AppSession = SessionStore<LocalStorage>;
pub type AppApi = ApiClient<FetchClient, LocalStorage>;

/// 认证上下文
///
/// 全部字段都是 arena 句柄，可以 Copy 进任意闭包。
#[derive(Clone, Copy)]
pub struct AuthContext {
    api: StoredValue<Arc<AppApi>>,
    /// 当前登录用户（由会话事件驱动）
    pub identity: RwSignal<Option<Identity>>,
    /// 启动时恢复会话期间为 true
    pub is_loading: RwSignal<bool>,
}

impl AuthContext {
    pub fn new(api_base_url: &str) -> Self {
        let session = Arc::new(AppSession::new(LocalStorage));
        let api = Arc::new(AppApi::new(api_base_url, FetchClient, session.clone()));

        let identity = RwSignal::new(None);
        bind_identity(&session, identity);

        Self {
            api: StoredValue::new(api),
            identity,
            is_loading: RwSignal::new(true),
        }
    }

    pub fn api(&self) -> Arc<AppApi> {
        self.api.get_value()
    }

    /// 认证状态信号（用于路由服务注入）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        authenticated(self.identity)
    }
}

/// 会话事件同步到身份信号：登录写入身份，注销和 401 失效清空
fn bind_identity<S: KeyValueStore>(session: &SessionStore<S>, identity: RwSignal<Option<Identity>>) {
    session.subscribe(move |event| match event {
        SessionEvent::LoggedIn(user) => identity.set(Some(user.clone())),
        SessionEvent::LoggedOut | SessionEvent::Invalidated => identity.set(None),
    });
}

fn authenticated(identity: RwSignal<Option<Identity>>) -> Signal<bool> {
    Signal::derive(move || identity.with(Option::is_some))
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 从持久化存储恢复会话
///
/// 恢复是同步的，完成后结束加载状态。
pub fn init_auth(ctx: &AuthContext) {
    let session = ctx.api().session().clone();
    if session.restore() {
        ctx.identity.set(session.identity());
    }
    ctx.is_loading.set(false);
}

/// 用表单身份换取令牌并建立会话
///
/// 成功后身份与令牌一起写入存储；会话事件会更新认证信号，由路由服务完成跳转。
pub async fn login<C: HttpClient, S: KeyValueStore>(
    api: &ApiClient<C, S>,
    identity: Identity,
) -> Result<(), ApiError> {
    let response = api.send(&LoginRequest::from(&identity)).await?;

    let token = BearerToken::new(response.token).ok_or_else(|| {
        warn!("[Auth] login response carried an empty token");
        ApiError::MissingToken
    })?;

    info!("[Auth] logged in as {}", identity.email);
    api.session().establish(Session::new(identity, token));
    Ok(())
}

/// 注销，只清理本地状态，不调用服务端
pub fn logout(ctx: &AuthContext) {
    ctx.api().session().logout();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{MemoryStorage, MockHttpClient};
    use sensordash_shared::{STORAGE_IDENTITY_KEY, STORAGE_TOKEN_KEY};
    use serde_json::json;

    const LOGIN_URL: &str = "https://api.test/login";

    fn client(storage: MemoryStorage) -> ApiClient<MockHttpClient, MemoryStorage> {
        let session = Arc::new(SessionStore::new(storage));
        ApiClient::new("https://api.test", MockHttpClient::new(), session)
    }

    fn ada() -> Identity {
        Identity::new("ada@example.com", "Ada", "Lovelace")
    }

    #[test]
    fn test_authenticated_signal_follows_session_events() {
        let owner = Owner::new();
        owner.set();

        let session = SessionStore::new(MemoryStorage::new());
        let identity = RwSignal::new(None);
        bind_identity(&session, identity);
        let is_authenticated = authenticated(identity);
        assert!(!is_authenticated.get_untracked());

        session.establish(Session::new(ada(), BearerToken::new("abc").unwrap()));
        assert!(is_authenticated.get_untracked());
        assert_eq!(identity.get_untracked(), Some(ada()));

        // 401 失效后受保护内容回到登录页
        session.invalidate();
        assert!(!is_authenticated.get_untracked());

        session.establish(Session::new(ada(), BearerToken::new("def").unwrap()));
        assert!(is_authenticated.get_untracked());
        session.logout();
        assert!(!is_authenticated.get_untracked());
        assert_eq!(identity.get_untracked(), None);
    }

    #[tokio::test]
    async fn test_login_persists_form_identity() {
        let storage = MemoryStorage::new();
        let api = client(storage.clone());
        // 服务端回显的内容被忽略，身份只来自表单
        api.http_client().mock_response(
            LOGIN_URL,
            200,
            json!({"token": "abc", "email": "other@example.com"}),
        );

        login(&api, ada()).await.unwrap();

        assert_eq!(api.session().identity(), Some(ada()));
        assert_eq!(storage.get(STORAGE_TOKEN_KEY).as_deref(), Some("abc"));
        let persisted: Identity =
            serde_json::from_str(&storage.get(STORAGE_IDENTITY_KEY).unwrap()).unwrap();
        assert_eq!(persisted, ada());

        let sent = api.http_client().last_request().unwrap();
        assert_eq!(
            sent.body.as_deref(),
            Some(r#"{"email":"ada@example.com","firstName":"Ada","lastName":"Lovelace"}"#)
        );
    }

    #[tokio::test]
    async fn test_login_failure_leaves_session_empty() {
        let storage = MemoryStorage::new();
        let api = client(storage.clone());
        api.http_client().mock_raw(LOGIN_URL, 500, "boom");

        assert!(matches!(
            login(&api, ada()).await,
            Err(ApiError::Status { status: 500, .. })
        ));
        assert!(!api.session().is_authenticated());
        assert!(!storage.contains(STORAGE_TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_login_rejects_empty_token() {
        let storage = MemoryStorage::new();
        let api = client(storage.clone());
        api.http_client()
            .mock_response(LOGIN_URL, 200, json!({"token": ""}));

        assert!(matches!(login(&api, ada()).await, Err(ApiError::MissingToken)));
        assert!(!api.session().is_authenticated());
        assert!(!storage.contains(STORAGE_IDENTITY_KEY));
    }

    #[tokio::test]
    async fn test_login_unauthorized_is_reported() {
        let api = client(MemoryStorage::new());
        api.http_client().mock_raw(LOGIN_URL, 401, "");

        assert!(matches!(login(&api, ada()).await, Err(ApiError::Unauthorized)));
        assert!(!api.session().is_authenticated());
    }
}
