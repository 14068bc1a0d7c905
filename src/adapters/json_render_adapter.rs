//! JSON layout adapter implementing RenderPort.
//!
//! Emits the layout payload as-is so an external plotting front end can
//! draw it.

use crate::domain::error::ChartError;
use crate::domain::layout::ChartLayout;
use crate::ports::render_port::RenderPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderAdapter {
    compact: bool,
}

impl JsonRenderAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-line output instead of pretty-printed.
    pub fn compact() -> Self {
        Self { compact: true }
    }
}

impl RenderPort for JsonRenderAdapter {
    fn render(&self, layout: &ChartLayout) -> Result<String, ChartError> {
        let mut document = if self.compact {
            serde_json::to_string(layout)?
        } else {
            serde_json::to_string_pretty(layout)?
        };
        document.push('\n');
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::{
        AxisTick, Panel, PanelDomain, PanelKind, Trace, TraceData, TraceStyle,
    };
    use chrono::NaiveDate;
    use serde_json::Value;
    use tempfile::TempDir;

    fn sample_layout() -> ChartLayout {
        ChartLayout {
            title: "7203".into(),
            x_axis_title: "Date".into(),
            y_axis_title: "Price".into(),
            dates: vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            ],
            panels: vec![Panel {
                kind: PanelKind::Price,
                title: "Price".into(),
                domain: PanelDomain {
                    bottom: 0.0,
                    top: 1.0,
                },
                traces: vec![Trace {
                    name: "MA5".into(),
                    x: vec![0, 1],
                    data: TraceData::Line {
                        y: vec![None, Some(101.5)],
                    },
                    style: TraceStyle::line("#ff007f", 1.2),
                }],
            }],
            x_ticks: vec![AxisTick {
                position: 0,
                label: "03/01".into(),
            }],
        }
    }

    #[test]
    fn undefined_values_become_null() {
        let json = JsonRenderAdapter::new().render(&sample_layout()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let trace = &value["panels"][0]["traces"][0];
        assert_eq!(trace["data"]["type"], "line");
        assert!(trace["data"]["y"][0].is_null());
        assert_eq!(trace["data"]["y"][1], 101.5);
    }

    #[test]
    fn unset_style_fields_are_omitted() {
        let json = JsonRenderAdapter::new().render(&sample_layout()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let style = value["panels"][0]["traces"][0]["style"].as_object().unwrap();
        assert!(style.contains_key("width"));
        assert!(!style.contains_key("fill_to_previous"));
    }

    #[test]
    fn dates_and_kinds_serialize_as_text() {
        let json = JsonRenderAdapter::compact().render(&sample_layout()).unwrap();
        assert_eq!(json.lines().count(), 1);
        assert!(json.contains("\"2024-03-04\""));
        assert!(json.contains("\"kind\":\"price\""));
    }

    #[test]
    fn write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.json");
        JsonRenderAdapter::new()
            .write(&sample_layout(), &path)
            .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"x_ticks\""));
    }
}
