use crate::auth::use_auth;
use crate::components::login::LoginPage;
use leptos::prelude::*;

/// 受保护内容：未认证时原地渲染登录页，认证后渲染子组件
///
/// 与路由服务的重定向互为补充，路由还未完成跳转时也不会露出受保护内容。
#[component]
pub fn ProtectedRoute(children: ChildrenFn) -> impl IntoView {
    let is_authenticated = use_auth().is_authenticated_signal();

    view! {
        <Show when=move || is_authenticated.get() fallback=|| view! { <LoginPage /> }>
            {children()}
        </Show>
    }
}
