//! 传感器面板前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `session` / `api`: 会话存储与带认证的 API 客户端（不依赖 DOM，可在原生测试中运行）
//! - `flow`: 面板的加载/提交状态机
//! - `web::route` / `web::router`: 路由定义与路由服务
//! - `auth`: 会话到响应式信号的桥接
//! - `components`: UI 组件层

pub mod api;
pub mod auth;
pub mod chart;
pub mod config;
pub mod flow;
pub mod session;
mod components {
    pub mod dashboard;
    pub mod guard;
    pub mod login;
}

use crate::auth::{AuthContext, init_auth};
use crate::components::dashboard::DashboardPage;
use crate::components::guard::ProtectedRoute;
use crate::components::login::LoginPage;
use crate::config::AppConfig;

use leptos::prelude::*;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub mod web {
    mod http;
    pub mod route;
    pub mod router;
    mod snapshot;
    mod storage;

    pub use http::{FetchClient, HttpClient, HttpError, HttpRequest, HttpResponse};
    pub use snapshot::CanvasSnapshot;
    pub use storage::{KeyValueStore, LocalStorage};

    #[cfg(test)]
    pub use http::MockHttpClient;
    #[cfg(test)]
    pub use storage::MemoryStorage;
}

use web::route::AppRoute;
use web::router::{Link, Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Dashboard => view! {
            <ProtectedRoute>
                <DashboardPage />
            </ProtectedRoute>
        }
        .into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link to=AppRoute::Dashboard.to_path() class="btn btn-primary mt-6">
                        "Back to dashboard"
                    </Link>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = use_context::<AppConfig>().unwrap_or_default();

    // 1. 创建认证上下文
    let auth_ctx = AuthContext::new(&config.api_base_url);
    provide_context(auth_ctx);

    // 2. 从 LocalStorage 恢复会话
    init_auth(&auth_ctx);

    // 3. 获取认证状态信号，用于注入路由服务
    let is_authenticated = auth_ctx.is_authenticated_signal();
    let is_loading = auth_ctx.is_loading;

    view! {
        <Show
            when=move || !is_loading.get()
            fallback=|| view! {
                <div class="flex items-center justify-center min-h-screen">
                    <span class="loading loading-spinner loading-lg text-primary"></span>
                    <span class="ml-2">"Loading..."</span>
                </div>
            }
        >
            <Router is_authenticated=is_authenticated>
                <RouterOutlet matcher=route_matcher />
            </Router>
        </Show>
    }
}
