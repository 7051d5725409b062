use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod form;
pub mod protocol;
pub mod serde_helper;
pub mod snapshot;
pub mod validation;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const STORAGE_TOKEN_KEY: &str = "token";
pub const STORAGE_IDENTITY_KEY: &str = "user";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

/// 图表纵轴固定范围，与实际数据无关
pub const CHART_Y_MIN: f64 = -1000.0;
pub const CHART_Y_MAX: f64 = 1000.0;

/// 提交快照的边长（像素）
pub const SNAPSHOT_SIZE: u32 = 128;

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 用户身份
///
/// 身份信息来自登录表单（客户端），后端只负责签发令牌，不回显身份。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Identity {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 登录请求体，字段与 `Identity` 一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Identity> for LoginRequest {
    fn from(identity: &Identity) -> Self {
        Self {
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// 一次拉取到的传感器数据，整体替换，从不合并
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub points: Vec<f64>,
    #[serde(with = "serde_helper::iso8601")]
    pub timestamp: DateTime<Utc>,
    pub line_number: i64,
}

impl SensorReading {
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// 提交给 `/results` 的分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSubmission {
    /// base64 编码的 PNG（不含 data URL 前缀）
    pub plot: String,
    pub description: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub line_number: i64,
}

impl AnalysisSubmission {
    pub fn new(
        snapshot: snapshot::Snapshot,
        description: &str,
        identity: &Identity,
        line_number: i64,
    ) -> Self {
        Self {
            plot: snapshot.into_base64(),
            description: description.trim().to_string(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email: identity.email.clone(),
            line_number,
        }
    }
}
