//! Direction filtering and trend statistics.

use crate::parser::LatencyRow;
use serde::Serialize;
use std::fmt;

/// Rows whose direction label contains `needle`.
///
/// Substring match: `"Home"` selects both `Home` and `RecoverHome` rows.
pub fn filter_direction(rows: &[LatencyRow], needle: &str) -> Vec<LatencyRow> {
    rows.iter()
        .filter(|row| row.direction.contains(needle))
        .cloned()
        .collect()
}

/// Summary of one latency series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSummary {
    /// Number of rows.
    pub count: usize,
    /// Fastest transition, seconds.
    pub min: f64,
    /// Slowest transition, seconds.
    pub max: f64,
    /// Mean transition, seconds.
    pub mean: f64,
    /// Least-squares slope of elapsed over iteration number (seconds per
    /// iteration). Positive means the actuator is getting slower.
    pub slope: f64,
}

impl TrendSummary {
    /// Summarize `rows`; `None` when empty.
    pub fn from_rows(rows: &[LatencyRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let n = rows.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for row in rows {
            min = min.min(row.elapsed);
            max = max.max(row.elapsed);
            sum += row.elapsed;
        }
        let mean = sum / n;

        let mean_x = rows.iter().map(|r| r.iteration as f64).sum::<f64>() / n;
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for row in rows {
            let dx = row.iteration as f64 - mean_x;
            sxy += dx * (row.elapsed - mean);
            sxx += dx * dx;
        }
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

        Some(Self {
            count: rows.len(),
            min,
            max,
            mean,
            slope,
        })
    }
}

impl fmt::Display for TrendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} min={:.6}s mean={:.6}s max={:.6}s slope={:+.3e}s/iter",
            self.count, self.min, self.mean, self.max, self.slope
        )
    }
}
