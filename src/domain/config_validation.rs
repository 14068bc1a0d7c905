//! Configuration validation.
//!
//! Validates every analysis key before the pipeline runs, so a bad period
//! or window is reported against the config file rather than mid-computation.

use crate::domain::analysis::ChartPreset;
use crate::domain::crossover::CrossoverConfig;
use crate::domain::error::ChartError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SLOW};
use crate::domain::indicator::StdDevKind;
use crate::ports::config_port::ConfigPort;
use crate::ports::render_port::OutputFormat;
use chrono::NaiveDate;

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), ChartError> {
    validate_dates(config)?;
    validate_period_list(config, "indicators", "sma_periods")?;
    validate_period_list(config, "indicators", "rsi_periods")?;
    validate_macd(config)?;
    validate_bollinger(config)?;
    validate_crossover(config)?;
    validate_chart(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ChartError {
    ChartError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse a comma separated list of positive periods, e.g. `5, 25, 75`.
pub fn parse_period_list(value: &str) -> Result<Vec<usize>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(0) => Err("periods must be positive".to_string()),
            Ok(p) => Ok(p),
            Err(_) => Err(format!("'{}' is not a period", s)),
        })
        .collect()
}

/// Read an optional positive integer, rejecting text that does not parse.
pub fn read_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, ChartError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => match s.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(invalid(section, key, format!("{} must be a positive integer", key))),
            Ok(v) => Ok(Some(v)),
        },
    }
}

/// Accepts the usual INI spellings of a boolean.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, ChartError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key))
    })
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let start = config
        .get_string("data", "start_date")
        .map(|s| parse_date(&s, "data", "start_date"))
        .transpose()?;
    let end = config
        .get_string("data", "end_date")
        .map(|s| parse_date(&s, "data", "end_date"))
        .transpose()?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid("data", "start_date", "start_date must be before end_date"));
        }
    }
    Ok(())
}

fn validate_period_list(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ChartError> {
    if let Some(value) = config.get_string(section, key) {
        parse_period_list(&value).map_err(|reason| invalid(section, key, reason))?;
    }
    Ok(())
}

fn validate_macd(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let fast = read_positive(config, "indicators", "macd_fast")?;
    let slow = read_positive(config, "indicators", "macd_slow")?;
    read_positive(config, "indicators", "macd_signal")?;

    let fast = fast.unwrap_or(DEFAULT_FAST);
    let slow = slow.unwrap_or(DEFAULT_SLOW);
    if fast >= slow {
        return Err(invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }
    Ok(())
}

fn validate_bollinger(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let period = read_positive(config, "indicators", "bollinger_period")?;

    let kind = match config.get_string("indicators", "bollinger_stddev") {
        Some(s) => s
            .parse::<StdDevKind>()
            .map_err(|reason| invalid("indicators", "bollinger_stddev", reason))?,
        None => StdDevKind::default(),
    };
    if let Some(p) = period {
        if p < kind.min_period() {
            return Err(invalid(
                "indicators",
                "bollinger_period",
                format!("{} standard deviation needs a period of at least {}", kind, kind.min_period()),
            ));
        }
    }

    if let Some(s) = config.get_string("indicators", "bollinger_multiplier") {
        match s.trim().parse::<f64>() {
            Ok(m) if m.is_finite() && m > 0.0 => {}
            _ => {
                return Err(invalid(
                    "indicators",
                    "bollinger_multiplier",
                    "bollinger_multiplier must be a positive number",
                ));
            }
        }
    }
    Ok(())
}

fn validate_crossover(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let defaults = CrossoverConfig::default();
    let short = read_positive(config, "crossover", "short_period")?.unwrap_or(defaults.short_period);
    let long = read_positive(config, "crossover", "long_period")?.unwrap_or(defaults.long_period);
    if short >= long {
        return Err(invalid(
            "crossover",
            "short_period",
            "short_period must be less than long_period",
        ));
    }
    Ok(())
}

fn validate_chart(config: &dyn ConfigPort) -> Result<(), ChartError> {
    if let Some(s) = config.get_string("chart", "preset") {
        s.parse::<ChartPreset>()
            .map_err(|reason| invalid("chart", "preset", reason))?;
    }
    if let Some(s) = config.get_string("chart", "format") {
        s.parse::<OutputFormat>()
            .map_err(|reason| invalid("chart", "format", reason))?;
    }
    read_positive(config, "chart", "window")?;
    read_positive(config, "chart", "tick_step")?;
    if let Some(s) = config.get_string("chart", "volume") {
        if parse_flag(&s).is_none() {
            return Err(invalid("chart", "volume", "volume must be true or false"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        data: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            let data = entries
                .iter()
                .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                .collect();
            Self { data }
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.data
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .map(|v| v == "true")
                .unwrap_or(default)
        }
    }

    fn assert_invalid(entries: &[(&str, &str, &str)], expected_key: &str) {
        let config = MockConfig::new(entries);
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(
            matches!(&err, ChartError::ConfigInvalid { key, .. } if key == expected_key),
            "expected invalid {expected_key}, got {err}"
        );
    }

    #[test]
    fn empty_config_is_valid() {
        assert!(validate_analysis_config(&MockConfig::new(&[])).is_ok());
    }

    #[test]
    fn full_config_is_valid() {
        let config = MockConfig::new(&[
            ("data", "start_date", "2020-01-01"),
            ("data", "end_date", "2024-12-31"),
            ("indicators", "sma_periods", "5, 25, 75"),
            ("indicators", "rsi_periods", "14,28"),
            ("indicators", "macd_fast", "12"),
            ("indicators", "macd_slow", "26"),
            ("indicators", "macd_signal", "9"),
            ("indicators", "bollinger_period", "25"),
            ("indicators", "bollinger_multiplier", "2.0"),
            ("indicators", "bollinger_stddev", "sample"),
            ("crossover", "short_period", "5"),
            ("crossover", "long_period", "25"),
            ("chart", "preset", "summary"),
            ("chart", "format", "svg"),
            ("chart", "window", "120"),
            ("chart", "tick_step", "3"),
            ("chart", "volume", "no"),
        ]);
        assert!(validate_analysis_config(&config).is_ok());
    }

    #[test]
    fn dates_out_of_order() {
        assert_invalid(
            &[
                ("data", "start_date", "2024-12-31"),
                ("data", "end_date", "2020-01-01"),
            ],
            "start_date",
        );
    }

    #[test]
    fn bad_date_format() {
        assert_invalid(&[("data", "end_date", "2024/12/31")], "end_date");
    }

    #[test]
    fn zero_in_period_list() {
        assert_invalid(&[("indicators", "sma_periods", "5,0,75")], "sma_periods");
    }

    #[test]
    fn non_numeric_period_list() {
        assert_invalid(&[("indicators", "rsi_periods", "fourteen")], "rsi_periods");
    }

    #[test]
    fn macd_fast_not_below_slow() {
        assert_invalid(
            &[("indicators", "macd_fast", "30"), ("indicators", "macd_slow", "26")],
            "macd_fast",
        );
    }

    #[test]
    fn macd_signal_zero() {
        assert_invalid(&[("indicators", "macd_signal", "0")], "macd_signal");
    }

    #[test]
    fn bollinger_sample_period_one() {
        assert_invalid(&[("indicators", "bollinger_period", "1")], "bollinger_period");
    }

    #[test]
    fn bollinger_population_period_one_is_fine() {
        let config = MockConfig::new(&[
            ("indicators", "bollinger_period", "1"),
            ("indicators", "bollinger_stddev", "population"),
        ]);
        assert!(validate_analysis_config(&config).is_ok());
    }

    #[test]
    fn bollinger_negative_multiplier() {
        assert_invalid(
            &[("indicators", "bollinger_multiplier", "-2")],
            "bollinger_multiplier",
        );
    }

    #[test]
    fn crossover_short_not_below_long() {
        assert_invalid(
            &[("crossover", "short_period", "25"), ("crossover", "long_period", "25")],
            "short_period",
        );
    }

    #[test]
    fn crossover_single_key_checked_against_default_pair() {
        let defaults = CrossoverConfig::default();
        let short = defaults.long_period.to_string();
        assert_invalid(&[("crossover", "short_period", short.as_str())], "short_period");
        let long = defaults.short_period.to_string();
        assert_invalid(&[("crossover", "long_period", long.as_str())], "short_period");

        let below_default_long = (defaults.long_period - 1).to_string();
        let config = MockConfig::new(&[("crossover", "short_period", below_default_long.as_str())]);
        assert!(validate_analysis_config(&config).is_ok());
    }

    #[test]
    fn macd_single_key_checked_against_default_pair() {
        let fast = DEFAULT_SLOW.to_string();
        assert_invalid(&[("indicators", "macd_fast", fast.as_str())], "macd_fast");
        let slow = DEFAULT_FAST.to_string();
        assert_invalid(&[("indicators", "macd_slow", slow.as_str())], "macd_fast");
    }

    #[test]
    fn unknown_preset() {
        assert_invalid(&[("chart", "preset", "pie")], "preset");
    }

    #[test]
    fn unknown_format() {
        assert_invalid(&[("chart", "format", "png")], "format");
    }

    #[test]
    fn zero_window() {
        assert_invalid(&[("chart", "window", "0")], "window");
    }

    #[test]
    fn volume_must_be_boolean() {
        assert_invalid(&[("chart", "volume", "sometimes")], "volume");
    }

    #[test]
    fn parse_period_list_skips_blanks() {
        assert_eq!(parse_period_list("5, ,25,").unwrap(), vec![5, 25]);
        assert!(parse_period_list("").unwrap().is_empty());
    }
}
