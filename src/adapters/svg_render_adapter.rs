//! Standalone SVG rendering of a chart layout.
//!
//! Panels share one horizontal axis: row `i` of the display window sits in
//! the middle of the `i`-th of `row_count` equal slots. Each panel scales
//! its own vertical axis to the values its traces draw.

use crate::domain::error::ChartError;
use crate::domain::layout::{ChartLayout, Panel, Trace, TraceData, TraceStyle};
use crate::ports::render_port::RenderPort;

const CHART_WIDTH: f64 = 1000.0;
const CHART_HEIGHT: f64 = 720.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const PANEL_GAP: f64 = 6.0;
const DEFAULT_LINE_WIDTH: f64 = 1.0;
const DEFAULT_MARKER_SIZE: f64 = 8.0;

#[derive(Debug, Clone, Copy)]
pub struct SvgRenderAdapter {
    width: f64,
    height: f64,
}

impl Default for SvgRenderAdapter {
    fn default() -> Self {
        Self {
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
        }
    }
}

impl SvgRenderAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn plot_width(&self) -> f64 {
        self.width - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - MARGIN_TOP - MARGIN_BOTTOM
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_err(reason: impl Into<String>) -> ChartError {
    ChartError::Render {
        reason: reason.into(),
    }
}

/// Pixel mapping for one panel.
struct Frame {
    left: f64,
    slot: f64,
    top: f64,
    bottom: f64,
    min: f64,
    max: f64,
}

impl Frame {
    fn x(&self, row: usize) -> f64 {
        self.left + (row as f64 + 0.5) * self.slot
    }

    fn y(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        self.bottom - (value - self.min) / range * (self.bottom - self.top)
    }
}

fn value_range(panel: &Panel) -> (f64, f64) {
    let (mut min, mut max) = panel
        .traces
        .iter()
        .flat_map(|t| t.data.values())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if panel.traces.iter().any(|t| matches!(t.data, TraceData::Bars { .. })) {
        min = min.min(0.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { max.abs().max(1.0) * 0.05 };
    min -= pad;
    max += pad;
    (min, max)
}

fn check_trace(trace: &Trace, rows: usize) -> Result<(), ChartError> {
    if trace.x.len() != trace.data.len() {
        return Err(render_err(format!(
            "trace {} has {} positions but {} values",
            trace.name,
            trace.x.len(),
            trace.data.len()
        )));
    }
    if let TraceData::Candlestick {
        open,
        high,
        low,
        close,
    } = &trace.data
    {
        if open.len() != close.len() || high.len() != close.len() || low.len() != close.len() {
            return Err(render_err(format!(
                "candlestick {} has ragged open/high/low/close columns",
                trace.name
            )));
        }
    }
    if let Some(&bad) = trace.x.iter().find(|&&x| x >= rows) {
        return Err(render_err(format!(
            "trace {} references row {} of {}",
            trace.name, bad, rows
        )));
    }
    Ok(())
}

fn line_width(style: &TraceStyle) -> f64 {
    style.width.unwrap_or(DEFAULT_LINE_WIDTH)
}

/// Path data for a line, lifting the pen across undefined values.
fn line_path(frame: &Frame, x: &[usize], y: &[Option<f64>]) -> String {
    let mut path = String::new();
    let mut pen_down = false;
    for (&row, value) in x.iter().zip(y) {
        match value {
            Some(v) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                path.push_str(&format!("{} {:.1} {:.1} ", cmd, frame.x(row), frame.y(*v)));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    path.trim_end().to_string()
}

/// Polygons covering each run of rows where both edges are defined.
fn band_polygons(
    frame: &Frame,
    lower_x: &[usize],
    lower: &[Option<f64>],
    upper: &[Option<f64>],
) -> Vec<String> {
    let mut polygons = Vec::new();
    let mut run: Vec<(usize, f64, f64)> = Vec::new();
    let rows = lower_x.iter().zip(lower.iter().zip(upper));
    for (&row, (lo, hi)) in rows {
        match (lo, hi) {
            (Some(lo), Some(hi)) => run.push((row, *lo, *hi)),
            _ => {
                if run.len() > 1 {
                    polygons.push(polygon_points(frame, &run));
                }
                run.clear();
            }
        }
    }
    if run.len() > 1 {
        polygons.push(polygon_points(frame, &run));
    }
    polygons
}

fn polygon_points(frame: &Frame, run: &[(usize, f64, f64)]) -> String {
    let forward = run
        .iter()
        .map(|(row, _, hi)| format!("{:.1},{:.1}", frame.x(*row), frame.y(*hi)));
    let back = run
        .iter()
        .rev()
        .map(|(row, lo, _)| format!("{:.1},{:.1}", frame.x(*row), frame.y(*lo)));
    forward.chain(back).collect::<Vec<_>>().join(" ")
}

fn draw_trace(svg: &mut String, frame: &Frame, trace: &Trace, previous: Option<&Trace>) {
    let style = &trace.style;
    let color = escape(&style.color);
    match &trace.data {
        TraceData::Candlestick {
            open,
            high,
            low,
            close,
        } => {
            let up = escape(style.increasing_color.as_deref().unwrap_or("green"));
            let down = escape(style.decreasing_color.as_deref().unwrap_or("red"));
            let body = (frame.slot * 0.6).max(1.0);
            for (i, &row) in trace.x.iter().enumerate() {
                let fill = if close[i] >= open[i] { &up } else { &down };
                let cx = frame.x(row);
                svg.push_str(&format!(
                    "  <line x1=\"{cx:.1}\" y1=\"{:.1}\" x2=\"{cx:.1}\" y2=\"{:.1}\" stroke=\"{fill}\" stroke-width=\"1\"/>\n",
                    frame.y(high[i]),
                    frame.y(low[i]),
                ));
                let top = frame.y(open[i].max(close[i]));
                let bottom = frame.y(open[i].min(close[i]));
                svg.push_str(&format!(
                    "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{fill}\"/>\n",
                    cx - body / 2.0,
                    top,
                    body,
                    (bottom - top).max(0.5),
                ));
            }
        }
        TraceData::Line { y } => {
            if let (Some(fill), Some(prev)) = (&style.fill_to_previous, previous) {
                if let TraceData::Line { y: upper } = &prev.data {
                    for points in band_polygons(frame, &trace.x, y, upper) {
                        svg.push_str(&format!(
                            "  <polygon points=\"{}\" fill=\"{}\" stroke=\"none\"/>\n",
                            points,
                            escape(fill)
                        ));
                    }
                }
            }
            let width = line_width(style);
            if width > 0.0 {
                let path = line_path(frame, &trace.x, y);
                if !path.is_empty() {
                    svg.push_str(&format!(
                        "  <path d=\"{path}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width}\"/>\n"
                    ));
                }
            }
        }
        TraceData::Markers { y } => {
            let r = style.marker_size.unwrap_or(DEFAULT_MARKER_SIZE) / 2.0;
            for (&row, value) in trace.x.iter().zip(y) {
                let Some(v) = value else { continue };
                let (cx, cy) = (frame.x(row), frame.y(*v));
                if style.marker_symbol.as_deref() == Some("x") {
                    svg.push_str(&format!(
                        "  <path d=\"M {:.1} {:.1} L {:.1} {:.1} M {:.1} {:.1} L {:.1} {:.1}\" stroke=\"{color}\" stroke-width=\"2\"/>\n",
                        cx - r, cy - r, cx + r, cy + r, cx - r, cy + r, cx + r, cy - r,
                    ));
                } else {
                    svg.push_str(&format!(
                        "  <circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"{color}\"/>\n"
                    ));
                }
            }
        }
        TraceData::Bars { y } => {
            let width = (frame.slot * 0.8).max(1.0);
            let base = frame.y(0.0_f64.max(frame.min));
            for (&row, v) in trace.x.iter().zip(y) {
                let top = frame.y(*v);
                svg.push_str(&format!(
                    "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{color}\"/>\n",
                    frame.x(row) - width / 2.0,
                    top.min(base),
                    width,
                    (base - top).abs(),
                ));
            }
        }
    }
}

impl SvgRenderAdapter {
    fn draw_panel(&self, svg: &mut String, panel: &Panel, rows: usize) -> Result<(), ChartError> {
        for trace in &panel.traces {
            check_trace(trace, rows)?;
        }

        let plot_height = self.plot_height();
        let top = MARGIN_TOP + (1.0 - panel.domain.top) * plot_height + PANEL_GAP / 2.0;
        let bottom = MARGIN_TOP + (1.0 - panel.domain.bottom) * plot_height - PANEL_GAP / 2.0;
        let (min, max) = value_range(panel);
        let frame = Frame {
            left: MARGIN_LEFT,
            slot: self.plot_width() / rows.max(1) as f64,
            top,
            bottom,
            min,
            max,
        };

        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT,
            top,
            self.plot_width(),
            bottom - top
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"#333\">{}</text>\n",
            MARGIN_LEFT + 4.0,
            top + 12.0,
            escape(&panel.title)
        ));
        for (value, y) in [(max, top + 10.0), (min, bottom - 2.0)] {
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
                MARGIN_LEFT - 5.0,
                y,
                value
            ));
        }

        let mut previous: Option<&Trace> = None;
        for trace in &panel.traces {
            draw_trace(svg, &frame, trace, previous);
            previous = Some(trace);
        }
        Ok(())
    }
}

impl RenderPort for SvgRenderAdapter {
    fn render(&self, layout: &ChartLayout) -> Result<String, ChartError> {
        if self.plot_width() <= 0.0 || self.plot_height() <= 0.0 {
            return Err(render_err(format!(
                "canvas {}x{} leaves no room to plot",
                self.width, self.height
            )));
        }
        let rows = layout.row_count();

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
            w = self.width,
            h = self.height
        ));
        svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\" fill=\"#222\">{}</text>\n",
            self.width / 2.0,
            escape(&layout.title)
        ));

        if rows == 0 {
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#666\">No data</text>\n",
                self.width / 2.0,
                self.height / 2.0
            ));
        } else {
            for panel in &layout.panels {
                self.draw_panel(&mut svg, panel, rows)?;
            }

            let slot = self.plot_width() / rows as f64;
            let axis_y = self.height - MARGIN_BOTTOM;
            for tick in &layout.x_ticks {
                if tick.position >= rows {
                    return Err(render_err(format!(
                        "tick {} references row {} of {}",
                        tick.label, tick.position, rows
                    )));
                }
                let x = MARGIN_LEFT + (tick.position as f64 + 0.5) * slot;
                svg.push_str(&format!(
                    "  <text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
                    axis_y + 14.0,
                    escape(&tick.label)
                ));
            }
        }

        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"11\" fill=\"#444\">{}</text>\n",
            MARGIN_LEFT + self.plot_width() / 2.0,
            self.height - 10.0,
            escape(&layout.x_axis_title)
        ));
        svg.push_str(&format!(
            "  <text x=\"14\" y=\"{:.1}\" transform=\"rotate(-90 14 {:.1})\" text-anchor=\"middle\" font-size=\"11\" fill=\"#444\">{}</text>\n",
            self.height / 2.0,
            self.height / 2.0,
            escape(&layout.y_axis_title)
        ));
        svg.push_str("</svg>\n");
        Ok(svg)
    }
}
