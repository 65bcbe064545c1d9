//! Daily index bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Market-wide volume for the same day, when the source carries it.
    pub total_volume: Option<f64>,
}

impl IndexBar {
    /// (high + low) / 2
    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// volume / total_volume * 100, rounded to two decimals.
    pub fn volume_share_pct(&self) -> Option<f64> {
        self.total_volume.and_then(|total| share_pct(self.volume, total))
    }
}

/// `part / whole * 100` rounded to two decimals; `None` when `whole` is zero
/// or either side is not finite.
pub fn share_pct(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 || !whole.is_finite() || !part.is_finite() {
        return None;
    }
    Some(round_to(part / whole * 100.0, 2))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
