//! 传感器面板流程
//!
//! 加载与提交是两条独立的状态线：
//! - 加载：`Idle -> Loading -> {Loaded, Failed}`
//! - 提交：`Idle -> Submitting -> {Submitted, Failed}`
//!
//! 状态转换是纯逻辑，异步操作只负责与 API 客户端交互，组件层把两者串起来。

use crate::api::{ApiClient, ApiError};
use crate::web::{HttpClient, KeyValueStore};
use log::{error, info};
use sensordash_shared::form::AnalysisForm;
use sensordash_shared::protocol::FetchPointsRequest;
use sensordash_shared::snapshot::{Snapshot, SnapshotError};
use sensordash_shared::{AnalysisSubmission, Identity, SensorReading};
use thiserror::Error;

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load sensor data";
pub const SUBMIT_ERROR_MESSAGE: &str = "Failed to submit analysis. Please try again.";
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Analysis submitted successfully!";

/// 图表快照来源
///
/// 在提交时同步调用，反映图表当前显示的内容。
pub trait SnapshotSource {
    fn capture(&self) -> Result<Snapshot, SnapshotError>;
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Submitted,
    Failed,
}

/// 提交时刻冻结下来的数据
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub description: String,
    pub identity: Identity,
    /// 提交时屏幕上显示的读数的行号
    pub line_number: i64,
}

impl PendingSubmission {
    pub fn into_submission(self, snapshot: Snapshot) -> AnalysisSubmission {
        AnalysisSubmission::new(snapshot, &self.description, &self.identity, self.line_number)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub reading: Option<SensorReading>,
    /// 每次成功加载加一，图表只跟随它重绘
    pub reading_revision: u64,
    pub load: LoadState,
    pub submit: SubmitState,
    pub form: AnalysisForm,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submit == SubmitState::Submitting
    }

    pub fn load_error(&self) -> Option<&'static str> {
        (self.load == LoadState::Failed).then_some(LOAD_ERROR_MESSAGE)
    }

    pub fn submit_error(&self) -> Option<&'static str> {
        (self.submit == SubmitState::Failed).then_some(SUBMIT_ERROR_MESSAGE)
    }

    pub fn success_notice(&self) -> Option<&'static str> {
        (self.submit == SubmitState::Submitted).then_some(SUBMIT_SUCCESS_MESSAGE)
    }

    pub fn begin_load(&mut self) {
        self.load = LoadState::Loading;
    }

    /// 成功时整体替换读数；失败时保留之前的读数继续显示
    pub fn finish_load(&mut self, result: Result<SensorReading, ApiError>) {
        match result {
            Ok(reading) => {
                info!(
                    "[Dashboard] loaded line {} with {} points",
                    reading.line_number,
                    reading.points.len()
                );
                self.reading = Some(reading);
                self.reading_revision += 1;
                self.load = LoadState::Loaded;
            }
            Err(e) => {
                error!("[Dashboard] error loading sensor data: {}", e);
                self.load = LoadState::Failed;
            }
        }
    }

    /// 提交按钮是否可用
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.form.is_valid() && self.reading.is_some()
    }

    /// 开始提交：强制 touch 描述字段并校验，前置条件都满足时冻结提交数据
    pub fn begin_submit(&mut self, identity: Option<&Identity>) -> Option<PendingSubmission> {
        let valid = self.form.submit();
        if !valid || self.is_submitting() {
            return None;
        }
        let reading = self.reading.as_ref()?;
        let identity = identity?;

        self.submit = SubmitState::Submitting;
        Some(PendingSubmission {
            description: self.form.trimmed().to_string(),
            identity: identity.clone(),
            line_number: reading.line_number,
        })
    }

    /// 结束提交，返回是否需要重新加载数据
    ///
    /// 成功时清空描述与 touched 状态；失败时保留表单内容以便重试。
    pub fn finish_submit(&mut self, result: Result<(), SubmitError>) -> bool {
        match result {
            Ok(()) => {
                info!("[Dashboard] analysis submitted");
                self.form.reset();
                self.submit = SubmitState::Submitted;
                true
            }
            Err(e) => {
                error!("[Dashboard] error submitting analysis: {}", e);
                self.submit = SubmitState::Failed;
                false
            }
        }
    }

    pub fn dismiss_notice(&mut self) {
        if self.submit == SubmitState::Submitted {
            self.submit = SubmitState::Idle;
        }
    }
}

// =========================================================
// 异步操作
// =========================================================

pub async fn load_reading<C: HttpClient, S: KeyValueStore>(
    api: &ApiClient<C, S>,
) -> Result<SensorReading, ApiError> {
    api.send(&FetchPointsRequest).await
}

/// 先同步截取快照，再发送提交请求
pub async fn submit_analysis<C: HttpClient, S: KeyValueStore>(
    api: &ApiClient<C, S>,
    pending: PendingSubmission,
    source: &impl SnapshotSource,
) -> Result<(), SubmitError> {
    let snapshot = source.capture()?;
    let submission = pending.into_submission(snapshot);
    api.send(&submission).await?;
    Ok(())
}
