//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其守卫规则。

use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 登录页面
    Login,
    /// 传感器面板 (默认路由，需要认证)
    #[default]
    Dashboard,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        match path {
            "/" | "/dashboard" => Self::Dashboard,
            "/login" => Self::Login,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::NotFound => "/404",
        }
    }

    /// 该路由是否需要认证
    pub fn requires_auth(self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// 已认证用户是否应该离开此路由
    pub fn should_redirect_when_authenticated(self) -> bool {
        matches!(self, Self::Login)
    }

    /// **核心守卫逻辑**：给定认证状态，返回需要重定向到的路由；无需重定向时返回 `None`
    pub fn guard(self, is_authenticated: bool) -> Option<Self> {
        if self.requires_auth() && !is_authenticated {
            Some(Self::Login)
        } else if self.should_redirect_when_authenticated() && is_authenticated {
            Some(Self::Dashboard)
        } else {
            None
        }
    }

    /// 守卫之后实际落地的路由
    pub fn resolve(self, is_authenticated: bool) -> Self {
        self.guard(is_authenticated).unwrap_or(self)
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}
