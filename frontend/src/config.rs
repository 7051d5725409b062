//! 运行时配置
//!
//! 配置在构建时通过环境变量注入（`option_env!`），启动时解析一次。

use log::LevelFilter;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// 后端 API 根地址（不含结尾的 `/`）
    pub api_base_url: String,
    pub log_level: LevelFilter,
}

impl AppConfig {
    /// 从构建时环境变量加载配置
    pub fn from_env() -> Self {
        Self::resolve(
            option_env!("SENSORDASH_API_URL"),
            option_env!("SENSORDASH_LOG_LEVEL"),
        )
    }

    /// 缺失或为空的值回退到默认值
    pub fn resolve(api_url: Option<&str>, log_level: Option<&str>) -> Self {
        let api_base_url = api_url
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string();

        let log_level = log_level
            .and_then(|level| level.trim().parse::<LevelFilter>().ok())
            .unwrap_or(DEFAULT_LOG_LEVEL);

        Self {
            api_base_url,
            log_level,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}
