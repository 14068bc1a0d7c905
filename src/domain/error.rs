//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for crosschart.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("series dates must be strictly increasing: index {index} has {current} after {previous}")]
    UnorderedSeries {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("overlay {name} was not computed")]
    MissingOverlay { name: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("render error: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ChartError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ChartError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Reject a zero period before any computation starts.
pub fn require_period(name: &str, period: usize) -> Result<(), ChartError> {
    if period == 0 {
        return Err(ChartError::invalid_parameter(name, "period must be positive"));
    }
    Ok(())
}

impl ChartError {
    /// Process exit status: 1 I/O, 2 config, 3 parameters, 5 data, 6 rendering.
    pub fn exit_code(&self) -> u8 {
        match self {
            ChartError::Io(_) => 1,
            ChartError::ConfigParse { .. }
            | ChartError::ConfigMissing { .. }
            | ChartError::ConfigInvalid { .. } => 2,
            ChartError::InvalidParameter { .. } | ChartError::MissingOverlay { .. } => 3,
            ChartError::UnorderedSeries { .. }
            | ChartError::Data { .. }
            | ChartError::NoData { .. } => 5,
            ChartError::Render { .. } | ChartError::Json(_) => 6,
        }
    }
}

impl From<&ChartError> for std::process::ExitCode {
    fn from(err: &ChartError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message() {
        let err = ChartError::invalid_parameter("sma", "period must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter sma: period must be positive"
        );
    }

    #[test]
    fn require_period_rejects_zero() {
        assert!(require_period("rsi", 0).is_err());
        assert!(require_period("rsi", 14).is_ok());
    }

    #[test]
    fn exit_codes_by_category() {
        let io = ChartError::from(std::io::Error::other("disk"));
        assert_eq!(io.exit_code(), 1);
        let missing = ChartError::ConfigMissing {
            section: "data".into(),
            key: "code".into(),
        };
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(ChartError::invalid_parameter("sma", "zero").exit_code(), 3);
        let no_data = ChartError::NoData {
            code: "7203".into(),
            exchange: "TSE".into(),
        };
        assert_eq!(no_data.exit_code(), 5);
        let render = ChartError::Render {
            reason: "canvas".into(),
        };
        assert_eq!(render.exit_code(), 6);
    }

    #[test]
    fn unordered_series_message_names_dates() {
        let err = ChartError::UnorderedSeries {
            index: 3,
            previous: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            current: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("index 3"));
        assert!(msg.contains("2024-01-04"));
        assert!(msg.contains("2024-01-05"));
    }
}
