//! 折线图
//!
//! 图表绘制交给 `plotters`，这里只描述“画什么”：标题、固定的纵轴范围和数据点。
//! 超出纵轴范围的值只在视觉上截断，原始读数保持不变。

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters_canvas::CanvasBackend;
use sensordash_shared::{CHART_Y_MAX, CHART_Y_MIN, SensorReading};
use std::ops::Range;
use web_sys::HtmlCanvasElement;

pub const SERIES_LABEL: &str = "Sensor Readings";
pub const SERIES_COLOR: RGBColor = RGBColor(75, 192, 192);

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub y_range: Range<f64>,
    pub points: Vec<f64>,
}

impl ChartSpec {
    pub fn for_reading(reading: &SensorReading) -> Self {
        Self {
            title: format!("Sensor Data - Line {}", reading.line_number),
            y_range: CHART_Y_MIN..CHART_Y_MAX,
            points: reading.points.clone(),
        }
    }

    /// 横轴为样本下标；单点或空数据时保留一个单位宽度
    pub fn x_range(&self) -> Range<f64> {
        let last = self.points.len().saturating_sub(1).max(1);
        0.0..last as f64
    }

    /// 实际绘制的坐标，非有限值被丢弃，越界值被截断到纵轴范围
    pub fn plotted_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, y)| y.is_finite())
            .map(|(x, y)| (x as f64, y.clamp(self.y_range.start, self.y_range.end)))
            .collect()
    }
}

pub fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(28)
        .y_label_area_size(52)
        .build_cartesian_2d(spec.x_range(), spec.y_range.clone())?;

    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(9)
        .x_label_formatter(&|x| format!("{}", x.round() as i64))
        .y_label_formatter(&|y| format!("{}", y.round() as i64))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            spec.plotted_points(),
            SERIES_COLOR.stroke_width(2),
        ))?
        .label(SERIES_LABEL)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SERIES_COLOR.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperMiddle)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// 绘制到页面上的 canvas 元素
pub fn render_to_canvas(canvas: HtmlCanvasElement, spec: &ChartSpec) -> Result<(), String> {
    let backend = CanvasBackend::with_canvas_object(canvas)
        .ok_or_else(|| "canvas has no 2d context".to_string())?;
    let root = backend.into_drawing_area();
    draw_chart(&root, spec).map_err(|e| e.to_string())
}
