//! Rolling standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / d)
//! where d = n - 1 for a sample and d = n for a population.
//! Warmup: first (n-1) values are undefined.

use crate::domain::error::{require_period, ChartError};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdDevKind {
    #[default]
    Sample,
    Population,
}

impl StdDevKind {
    /// Smallest window with a defined deviation.
    pub fn min_period(self) -> usize {
        match self {
            StdDevKind::Sample => 2,
            StdDevKind::Population => 1,
        }
    }

    fn divisor(self, period: usize) -> f64 {
        match self {
            StdDevKind::Sample => (period - 1) as f64,
            StdDevKind::Population => period as f64,
        }
    }
}

impl fmt::Display for StdDevKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdDevKind::Sample => write!(f, "sample"),
            StdDevKind::Population => write!(f, "population"),
        }
    }
}

impl FromStr for StdDevKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sample" => Ok(StdDevKind::Sample),
            "population" => Ok(StdDevKind::Population),
            other => Err(format!("unknown standard deviation kind '{}'", other)),
        }
    }
}

pub fn rolling_std_dev(
    values: &[f64],
    period: usize,
    kind: StdDevKind,
) -> Result<Vec<Option<f64>>, ChartError> {
    require_period("stddev period", period)?;
    if period < kind.min_period() {
        return Err(ChartError::invalid_parameter(
            "stddev period",
            format!("{} standard deviation needs a period of at least {}", kind, kind.min_period()),
        ));
    }

    let divisor = kind.divisor(period);
    Ok((0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / divisor;
            Some(variance.sqrt())
        })
        .collect())
}
