//! Core domain types and logic.

pub mod analysis;
pub mod config_validation;
pub mod crossover;
pub mod error;
pub mod indicator;
pub mod layout;
pub mod ohlcv;
