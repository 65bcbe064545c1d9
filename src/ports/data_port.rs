//! Data access port trait.

use crate::domain::column::RejectedCell;
use crate::domain::error::IndexvolError;
use crate::domain::ohlcv::IndexBar;

/// Bars for one code plus every cell the active error policy tolerated.
#[derive(Debug, Clone, Default)]
pub struct LoadedSeries {
    pub code: String,
    pub bars: Vec<IndexBar>,
    pub rejected: Vec<RejectedRow>,
}

impl LoadedSeries {
    pub fn dropped_rows(&self) -> usize {
        self.rejected.iter().filter(|r| r.dropped).count()
    }
}

#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub column: String,
    pub cell: RejectedCell,
    /// The row was left out of `bars` rather than kept with a NaN.
    pub dropped: bool,
}

pub trait DataPort {
    fn fetch_bars(&self, code: &str) -> Result<LoadedSeries, IndexvolError>;

    fn list_codes(&self) -> Result<Vec<String>, IndexvolError>;
}
