//! Derived series over index bars: date filters, per-year overlays and
//! two-index alignment.

use crate::domain::ohlcv::{share_pct, IndexBar};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Year every overlay point is rebased to. A leap year, so Feb 29 survives.
pub const OVERLAY_BASE_YEAR: i32 = 2000;

/// Bars with `start <= date <= end`; either bound may be open.
pub fn filter_range(
    bars: &[IndexBar],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<IndexBar> {
    bars.iter()
        .filter(|b| start.is_none_or(|s| b.date >= s))
        .filter(|b| end.is_none_or(|e| b.date <= e))
        .cloned()
        .collect()
}

/// Bars whose calendar month (1-12) is in `months`. An empty list keeps everything.
pub fn filter_months(bars: &[IndexBar], months: &[u32]) -> Vec<IndexBar> {
    if months.is_empty() {
        return bars.to_vec();
    }
    bars.iter()
        .filter(|b| months.contains(&b.date.month()))
        .cloned()
        .collect()
}

/// Parse a comma-separated month list such as `"9,10,11,12"`.
pub fn parse_months(input: &str) -> Result<Vec<u32>, String> {
    let mut months = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err("empty token in month list".to_string());
        }
        let month: u32 = trimmed
            .parse()
            .map_err(|_| format!("invalid month '{}'", trimmed))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month {} out of range 1-12", month));
        }
        if !months.contains(&month) {
            months.push(month);
        }
    }
    Ok(months)
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPoint {
    /// Original date moved to [`OVERLAY_BASE_YEAR`].
    pub day: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub midpoint: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub year: i32,
    pub points: Vec<OverlayPoint>,
}

/// Group bars by calendar year, oldest first, with each date rebased so
/// years can be drawn on a shared month/day axis.
pub fn overlay_by_year(bars: &[IndexBar]) -> Vec<YearSeries> {
    let mut years: BTreeMap<i32, Vec<OverlayPoint>> = BTreeMap::new();

    for bar in bars {
        let Some(day) = bar.date.with_year(OVERLAY_BASE_YEAR) else {
            continue;
        };
        years.entry(bar.date.year()).or_default().push(OverlayPoint {
            day,
            high: bar.high,
            low: bar.low,
            midpoint: bar.midpoint(),
        });
    }

    years
        .into_iter()
        .map(|(year, mut points)| {
            points.sort_by_key(|p| p.day);
            YearSeries { year, points }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub primary_mid: f64,
    pub secondary_mid: f64,
    pub primary_volume: f64,
    pub secondary_volume: f64,
    /// primary volume as a percentage of secondary volume.
    pub volume_share_pct: Option<f64>,
}

/// Inner join of two bar series on date, in date order.
pub fn align(primary: &[IndexBar], secondary: &[IndexBar]) -> Vec<AlignedRow> {
    let by_date: HashMap<NaiveDate, &IndexBar> =
        secondary.iter().map(|b| (b.date, b)).collect();

    let mut rows: Vec<AlignedRow> = primary
        .iter()
        .filter_map(|p| {
            let s = by_date.get(&p.date)?;
            Some(AlignedRow {
                date: p.date,
                primary_mid: p.midpoint(),
                secondary_mid: s.midpoint(),
                primary_volume: p.volume,
                secondary_volume: s.volume,
                volume_share_pct: share_pct(p.volume, s.volume),
            })
        })
        .collect();

    rows.sort_by_key(|r| r.date);
    rows
}
