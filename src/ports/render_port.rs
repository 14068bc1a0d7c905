//! Chart rendering port trait.

use crate::domain::error::ChartError;
use crate::domain::layout::ChartLayout;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unknown output format '{}' (expected json or svg)", other)),
        }
    }
}

/// Port for handing a finished layout to whatever draws it.
pub trait RenderPort {
    fn render(&self, layout: &ChartLayout) -> Result<String, ChartError>;

    /// Default implementation: render, then write the document to `output_path`.
    fn write(&self, layout: &ChartLayout, output_path: &Path) -> Result<(), ChartError> {
        let document = self.render(layout)?;
        std::fs::write(output_path, document)?;
        Ok(())
    }
}
