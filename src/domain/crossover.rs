//! Golden/dead cross detection over a short and a long moving average.
//!
//! # Detection Semantics
//!
//! - Each index is `Above` (short > long), `Below` (short <= long) or
//!   `Unknown` (either average undefined).
//! - The detector remembers the last defined state. The first defined state
//!   only establishes that memory; `Unknown` indices never emit and leave the
//!   memory untouched.
//! - `Below -> Above` emits `Golden` priced at the short average.
//! - `Above -> Below` emits `Dead` priced at the long average.
//! - A touch (short == long) counts as `Below`.

use crate::domain::error::{require_period, ChartError};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossState {
    Above,
    Below,
    Unknown,
}

impl CrossState {
    pub fn classify(short: Option<f64>, long: Option<f64>) -> Self {
        match (short, long) {
            (Some(s), Some(l)) if s > l => CrossState::Above,
            (Some(_), Some(_)) => CrossState::Below,
            _ => CrossState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossKind {
    Golden,
    Dead,
}

impl fmt::Display for CrossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossKind::Golden => write!(f, "GOLDEN"),
            CrossKind::Dead => write!(f, "DEAD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossoverEvent {
    pub index: usize,
    pub date: NaiveDate,
    pub kind: CrossKind,
    pub price: f64,
}

/// Short/long moving-average periods for crossover detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverConfig {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            short_period: 5,
            long_period: 25,
        }
    }
}

impl CrossoverConfig {
    pub fn validate(&self) -> Result<(), ChartError> {
        require_period("crossover short period", self.short_period)?;
        require_period("crossover long period", self.long_period)?;
        if self.short_period >= self.long_period {
            return Err(ChartError::invalid_parameter(
                "crossover short period",
                format!(
                    "short period {} must be less than long period {}",
                    self.short_period, self.long_period
                ),
            ));
        }
        Ok(())
    }
}

pub fn detect_crossovers(
    dates: &[NaiveDate],
    short: &[Option<f64>],
    long: &[Option<f64>],
) -> Result<Vec<CrossoverEvent>, ChartError> {
    if short.len() != dates.len() || long.len() != dates.len() {
        return Err(ChartError::invalid_parameter(
            "crossover inputs",
            format!(
                "length mismatch: {} dates, {} short values, {} long values",
                dates.len(),
                short.len(),
                long.len()
            ),
        ));
    }

    let mut events = Vec::new();
    let mut previous = CrossState::Unknown;

    for (index, date) in dates.iter().enumerate() {
        let current = CrossState::classify(short[index], long[index]);
        let kind = match (previous, current) {
            (_, CrossState::Unknown) => continue,
            (CrossState::Below, CrossState::Above) => Some(CrossKind::Golden),
            (CrossState::Above, CrossState::Below) => Some(CrossKind::Dead),
            _ => None,
        };
        previous = current;

        if let Some(kind) = kind {
            // Both values are defined for any state other than Unknown.
            let price = match kind {
                CrossKind::Golden => short[index],
                CrossKind::Dead => long[index],
            };
            if let Some(price) = price {
                events.push(CrossoverEvent {
                    index,
                    date: *date,
                    kind,
                    price,
                });
            }
        }
    }

    Ok(events)
}
