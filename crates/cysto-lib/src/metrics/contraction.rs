use crate::sections::align_length;
use serde::{Deserialize, Serialize};

/// One contraction: peak time and pressure plus its interval and duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakRow {
    pub time: f64,
    pub bladder_p: f64,
    /// Time since the previous peak; `None` for the first one.
    pub ici: Option<f64>,
    /// Baseline time minus pressure-threshold time for the matching pair, if any.
    pub cd: Option<f64>,
}

/// Inter-contractile intervals between consecutive peak times.
pub fn intercontractile_intervals(time: &[f64], peaks: &[usize]) -> Vec<f64> {
    peaks.windows(2).map(|w| time[w[1]] - time[w[0]]).collect()
}

/// Contractile durations for baselines and pressure thresholds paired after end truncation.
pub fn contractile_durations(time: &[f64], baselines: &[usize], thresholds: &[usize]) -> Vec<f64> {
    let (baselines, thresholds) = align_length(baselines, thresholds);
    baselines
        .iter()
        .zip(&thresholds)
        .map(|(&b, &t)| time[b] - time[t])
        .collect()
}

/// One row per peak. Peaks past the last baseline/threshold pair keep their row
/// with `cd` left empty instead of being dropped.
pub fn peak_rows(
    time: &[f64],
    pressure: &[f64],
    peaks: &[usize],
    baselines: &[usize],
    thresholds: &[usize],
) -> Vec<PeakRow> {
    let intervals = intercontractile_intervals(time, peaks);
    let durations = contractile_durations(time, baselines, thresholds);
    peaks
        .iter()
        .enumerate()
        .map(|(i, &peak)| PeakRow {
            time: time[peak],
            bladder_p: pressure[peak],
            ici: i.checked_sub(1).and_then(|prev| intervals.get(prev).copied()),
            cd: durations.get(i).copied(),
        })
        .collect()
}
