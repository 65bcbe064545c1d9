//! Core domain types and logic.

pub mod magnitude;
pub mod column;
pub mod ohlcv;
pub mod series;
pub mod config_validation;
pub mod error;
