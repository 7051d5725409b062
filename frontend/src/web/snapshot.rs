//! Canvas 快照模块
//!
//! 把正在显示的图表画布缩放绘制到一张新的白底 128x128 画布上，再编码为 PNG。

use crate::flow::SnapshotSource;
use sensordash_shared::SNAPSHOT_SIZE;
use sensordash_shared::snapshot::{Snapshot, SnapshotError};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// 基于页面 canvas 元素的快照来源
pub struct CanvasSnapshot {
    source: Option<HtmlCanvasElement>,
    rendered: bool,
}

impl CanvasSnapshot {
    /// # Arguments
    /// * `source` - 图表所在的 canvas（未挂载时为 `None`）
    /// * `rendered` - 图表是否至少完成过一次绘制
    pub fn new(source: Option<HtmlCanvasElement>, rendered: bool) -> Self {
        Self { source, rendered }
    }
}

fn canvas_err(e: wasm_bindgen::JsValue) -> SnapshotError {
    SnapshotError::Canvas(format!("{:?}", e))
}

impl SnapshotSource for CanvasSnapshot {
    fn capture(&self) -> Result<Snapshot, SnapshotError> {
        let source = match (&self.source, self.rendered) {
            (Some(source), true) => source,
            _ => return Err(SnapshotError::ChartNotRendered),
        };

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| SnapshotError::Canvas("无法获取 document 对象".to_string()))?;

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(canvas_err)?
            .dyn_into()
            .map_err(|_| SnapshotError::Canvas("元素不是 canvas".to_string()))?;
        canvas.set_width(SNAPSHOT_SIZE);
        canvas.set_height(SNAPSHOT_SIZE);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(canvas_err)?
            .ok_or_else(|| SnapshotError::Canvas("无法获取 2d 上下文".to_string()))?
            .dyn_into()
            .map_err(|_| SnapshotError::Canvas("上下文类型转换失败".to_string()))?;

        let size = f64::from(SNAPSHOT_SIZE);
        ctx.set_fill_style_str("white");
        ctx.fill_rect(0.0, 0.0, size, size);
        ctx.draw_image_with_html_canvas_element_and_dw_and_dh(source, 0.0, 0.0, size, size)
            .map_err(canvas_err)?;

        let data_url = canvas.to_data_url_with_type("image/png").map_err(canvas_err)?;
        Snapshot::from_data_url(&data_url)
    }
}
