//! Grouping of per-identity sighting timestamps into appearance intervals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Appearance span in seconds, both ends rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn interval(first_ms: f64, last_ms: f64) -> Interval {
    Interval {
        start: round2(first_ms / 1000.0),
        end: round2(last_ms / 1000.0),
    }
}

/// Split millisecond timestamps into runs and return each run's span.
///
/// A run ends where two consecutive timestamps (compared after rounding to two
/// decimals) are more than `gap_ms` apart. Timestamps are taken in the given
/// order.
pub fn intervals(timestamps_ms: &[f64], gap_ms: f64) -> Vec<Interval> {
    let Some(&first) = timestamps_ms.first() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut run_start = first;
    for pair in timestamps_ms.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if (round2(next) - round2(prev)).abs() > gap_ms {
            out.push(interval(run_start, prev));
            run_start = next;
        }
    }
    if let Some(&last) = timestamps_ms.last() {
        out.push(interval(run_start, last));
    }
    out
}

/// [`intervals`] for every identity.
pub fn appearances(
    sightings: &BTreeMap<String, Vec<f64>>,
    gap_ms: f64,
) -> BTreeMap<String, Vec<Interval>> {
    sightings
        .iter()
        .map(|(name, ts)| (name.clone(), intervals(ts, gap_ms)))
        .collect()
}
