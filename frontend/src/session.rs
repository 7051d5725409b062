//! 会话存储
//!
//! 持有当前用户的身份与令牌，负责持久化与恢复。
//! 身份来自客户端（登录表单），令牌来自服务端；后端只是令牌签发者，不是身份权威。
//!
//! 会话对象由 API 客户端共享持有，失效通过 `SessionEvent` 通知订阅者，
//! 而不是由各组件直接改写存储并强制跳转。

use crate::web::KeyValueStore;
use log::{debug, info, warn};
use sensordash_shared::{Identity, STORAGE_IDENTITY_KEY, STORAGE_TOKEN_KEY};
use std::fmt;
use std::sync::{Mutex, RwLock};

/// 旧版本前端会把 JS 的 `undefined` 序列化成字面量写入存储
const UNDEFINED_SENTINEL: &str = "undefined";

/// 服务端签发的不透明令牌
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// 空令牌视为不存在
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// 已认证的会话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: Identity,
    token: BearerToken,
}

impl Session {
    /// # Arguments
    /// * `identity` - 客户端提供的身份（登录表单内容），作为唯一可信身份
    /// * `token` - 服务端签发的令牌，只用于请求认证
    pub fn new(identity: Identity, token: BearerToken) -> Self {
        Self { identity, token }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }
}

/// 会话变化事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(Identity),
    LoggedOut,
    /// 服务端拒绝了令牌 (401)
    Invalidated,
}

type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

pub struct SessionStore<S: KeyValueStore> {
    storage: S,
    session: RwLock<Option<Session>>,
    listeners: Mutex<Vec<Listener>>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            session: RwLock::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// 订阅会话变化
    pub fn subscribe(&self, listener: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Box::new(listener));
        }
    }

    /// 启动时从持久化存储恢复会话
    ///
    /// 两个键必须同时存在且可解析，否则清除两者，回到未登录状态。
    pub fn restore(&self) -> bool {
        match self.read_persisted() {
            Some(session) => {
                info!("[Session] restored session for {}", session.identity().email);
                self.replace(Some(session));
                true
            }
            None => {
                self.clear_persisted();
                self.replace(None);
                false
            }
        }
    }

    fn read_persisted(&self) -> Option<Session> {
        let token = self.storage.get(STORAGE_TOKEN_KEY)?;
        let blob = self.storage.get(STORAGE_IDENTITY_KEY)?;

        if token == UNDEFINED_SENTINEL || blob == UNDEFINED_SENTINEL {
            debug!("[Session] persisted session holds the undefined sentinel, discarding");
            return None;
        }

        let identity: Identity = match serde_json::from_str(&blob) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("[Session] corrupt persisted identity, discarding: {}", e);
                return None;
            }
        };

        if identity.email.trim().is_empty() {
            warn!("[Session] persisted identity has no email, discarding");
            return None;
        }

        Some(Session::new(identity, BearerToken::new(token)?))
    }

    /// 建立新会话（登录成功后调用），写入内存和持久化存储
    ///
    /// 持久化失败时会话仍在内存中生效，但不会留下只写了一半的键值对。
    pub fn establish(&self, session: Session) {
        if !self.persist(&session) {
            self.clear_persisted();
        }

        let identity = session.identity().clone();
        self.replace(Some(session));
        self.emit(&SessionEvent::LoggedIn(identity));
    }

    fn persist(&self, session: &Session) -> bool {
        let blob = match serde_json::to_string(session.identity()) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("[Session] failed to serialize identity: {}", e);
                return false;
            }
        };

        if !self.storage.set(STORAGE_TOKEN_KEY, session.token().as_str()) {
            warn!("[Session] failed to write {} to storage", STORAGE_TOKEN_KEY);
            return false;
        }
        if !self.storage.set(STORAGE_IDENTITY_KEY, &blob) {
            warn!("[Session] failed to write {} to storage", STORAGE_IDENTITY_KEY);
            return false;
        }
        true
    }

    /// 用户主动注销，不调用服务端。可重复调用。
    pub fn logout(&self) {
        if self.clear() {
            info!("[Session] logged out");
            self.emit(&SessionEvent::LoggedOut);
        }
    }

    /// 令牌被服务端拒绝。可重复调用。
    pub fn invalidate(&self) {
        if self.clear() {
            warn!("[Session] credential rejected by server, session invalidated");
            self.emit(&SessionEvent::Invalidated);
        }
    }

    /// 清除内存和持久化状态，返回之前是否处于登录状态
    fn clear(&self) -> bool {
        self.clear_persisted();
        self.replace(None)
    }

    fn clear_persisted(&self) {
        self.storage.delete(STORAGE_TOKEN_KEY);
        self.storage.delete(STORAGE_IDENTITY_KEY);
    }

    /// 返回被替换的会话是否存在
    fn replace(&self, session: Option<Session>) -> bool {
        match self.session.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, session).is_some(),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), session).is_some(),
        }
    }

    fn emit(&self, event: &SessionEvent) {
        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.iter() {
                listener(event);
            }
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.current().map(|s| s.identity().clone())
    }

    pub fn token(&self) -> Option<BearerToken> {
        self.current().map(|s| s.token().clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().map(|s| s.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::MemoryStorage;
    use std::sync::Arc;

    const IDENTITY_JSON: &str =
        r#"{"email":"ada@example.com","firstName":"Ada","lastName":"Lovelace"}"#;

    fn ada() -> Identity {
        Identity::new("ada@example.com", "Ada", "Lovelace")
    }

    fn recorded_events(store: &SessionStore<MemoryStorage>) -> Arc<Mutex<Vec<SessionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    #[test]
    fn test_restore_valid_session() {
        let storage = MemoryStorage::new()
            .with(STORAGE_TOKEN_KEY, "abc")
            .with(STORAGE_IDENTITY_KEY, IDENTITY_JSON);
        let store = SessionStore::new(storage.clone());

        assert!(store.restore());
        assert!(store.is_authenticated());
        assert_eq!(store.identity(), Some(ada()));
        assert_eq!(store.token().unwrap().as_str(), "abc");
        assert!(storage.contains(STORAGE_TOKEN_KEY));
    }

    #[test]
    fn test_restore_undefined_token_clears_both_keys() {
        let storage = MemoryStorage::new()
            .with(STORAGE_TOKEN_KEY, "undefined")
            .with(STORAGE_IDENTITY_KEY, IDENTITY_JSON);
        let store = SessionStore::new(storage.clone());

        assert!(!store.restore());
        assert!(!store.is_authenticated());
        assert!(!storage.contains(STORAGE_TOKEN_KEY));
        assert!(!storage.contains(STORAGE_IDENTITY_KEY));
    }

    #[test]
    fn test_restore_discards_partial_or_corrupt_pairs() {
        let cases = [
            MemoryStorage::new().with(STORAGE_TOKEN_KEY, "abc"),
            MemoryStorage::new().with(STORAGE_IDENTITY_KEY, IDENTITY_JSON),
            MemoryStorage::new()
                .with(STORAGE_TOKEN_KEY, "abc")
                .with(STORAGE_IDENTITY_KEY, "undefined"),
            MemoryStorage::new()
                .with(STORAGE_TOKEN_KEY, "abc")
                .with(STORAGE_IDENTITY_KEY, "{not json"),
            MemoryStorage::new()
                .with(STORAGE_TOKEN_KEY, "abc")
                .with(STORAGE_IDENTITY_KEY, r#"{"email":"","firstName":"A","lastName":"B"}"#),
            MemoryStorage::new()
                .with(STORAGE_TOKEN_KEY, "abc")
                .with(STORAGE_IDENTITY_KEY, r#"{"firstName":"Ada","lastName":"Lovelace"}"#),
            MemoryStorage::new()
                .with(STORAGE_TOKEN_KEY, "")
                .with(STORAGE_IDENTITY_KEY, IDENTITY_JSON),
        ];

        for storage in cases {
            let store = SessionStore::new(storage.clone());
            assert!(!store.restore());
            assert!(!store.is_authenticated());
            assert!(!storage.contains(STORAGE_TOKEN_KEY));
            assert!(!storage.contains(STORAGE_IDENTITY_KEY));
        }
    }

    #[test]
    fn test_establish_persists_and_notifies() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        let events = recorded_events(&store);

        store.establish(Session::new(ada(), BearerToken::new("abc").unwrap()));

        assert!(store.is_authenticated());
        assert_eq!(storage.get(STORAGE_TOKEN_KEY).as_deref(), Some("abc"));
        let persisted: Identity =
            serde_json::from_str(&storage.get(STORAGE_IDENTITY_KEY).unwrap()).unwrap();
        assert_eq!(persisted, ada());
        assert_eq!(*events.lock().unwrap(), vec![SessionEvent::LoggedIn(ada())]);
    }

    /// 拒绝写入指定键的存储
    struct RejectingStorage {
        inner: MemoryStorage,
        rejected: &'static str,
    }

    impl KeyValueStore for RejectingStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> bool {
            key != self.rejected && self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> bool {
            self.inner.delete(key)
        }
    }

    #[test]
    fn test_failed_write_leaves_no_half_pair() {
        let inner = MemoryStorage::new();
        let store = SessionStore::new(RejectingStorage {
            inner: inner.clone(),
            rejected: STORAGE_IDENTITY_KEY,
        });

        store.establish(Session::new(ada(), BearerToken::new("abc").unwrap()));

        assert!(store.is_authenticated());
        assert_eq!(store.identity(), Some(ada()));
        assert!(!inner.contains(STORAGE_TOKEN_KEY));
        assert!(!inner.contains(STORAGE_IDENTITY_KEY));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        let events = recorded_events(&store);
        store.establish(Session::new(ada(), BearerToken::new("abc").unwrap()));

        store.logout();
        store.logout();
        store.invalidate();

        assert!(!store.is_authenticated());
        assert!(!storage.contains(STORAGE_TOKEN_KEY));
        assert!(!storage.contains(STORAGE_IDENTITY_KEY));
        assert_eq!(
            *events.lock().unwrap(),
            vec![SessionEvent::LoggedIn(ada()), SessionEvent::LoggedOut]
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("super-secret").unwrap();
        assert_eq!(format!("{:?}", token), "BearerToken(***)");
        assert_eq!(token.header_value(), "Bearer super-secret");
        assert!(BearerToken::new("").is_none());
    }
}
