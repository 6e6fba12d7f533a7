//! Pressure-threshold search.
//!
//! For every baseline → peak stretch the onset of the pressure rise is the last
//! sample where the smoothed second slope reaches the section's percentile
//! threshold while pressure is rising. When nothing qualifies the threshold is
//! relaxed in fixed steps until a hit appears or it reaches zero.

use crate::{
    sections::{bound_all, open_then, pair_to_bounds, percentile, segment, then_open, Bound},
    signal::{Landmarks, PressureThreshold},
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Slope below which the hit gate re-arms.
pub const REARM_SLOPE: f64 = 0.01;
/// Amount the threshold is lowered after a pass without hits.
pub const RELAXATION_STEP: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearch {
    /// One entry per baseline → peak stretch, in peak order.
    pub thresholds: Vec<PressureThreshold>,
    /// Baseline-to-baseline sections the percentiles were taken over.
    pub baseline_bounds: Vec<Bound>,
    /// Threshold per baseline section; searched sections hold the value actually used.
    pub section_thresholds: Vec<f64>,
}

impl ThresholdSearch {
    pub fn indices(&self) -> Vec<usize> {
        self.thresholds.iter().map(|t| t.index).collect()
    }
}

/// Percentile of `slope2` within each baseline-to-baseline section.
///
/// The first section starts at the beginning of the series and the last one
/// runs to its end. An empty section yields a threshold of zero.
pub fn section_percentiles(slope2: &[f64], baselines: &[usize], pct: f64) -> (Vec<Bound>, Vec<f64>) {
    let bounds = pair_to_bounds(open_then(baselines), then_open(baselines));
    let thresholds = segment(slope2, &bounds)
        .map(|section| percentile(&section, pct).unwrap_or(0.0))
        .collect();
    (bounds, thresholds)
}

pub fn find_pressure_thresholds(
    slope: &[f64],
    slope2: &[f64],
    landmarks: &Landmarks,
    pct: f64,
) -> ThresholdSearch {
    let (baseline_bounds, mut section_thresholds) =
        section_percentiles(slope2, &landmarks.baselines, pct);
    let rise_bounds = pair_to_bounds(open_then(&landmarks.baselines), bound_all(&landmarks.peaks));

    let mut thresholds = Vec::with_capacity(rise_bounds.len());
    for (bound, section_threshold) in rise_bounds.iter().zip(section_thresholds.iter_mut()) {
        let found = search_section(slope, slope2, bound, *section_threshold);
        *section_threshold = found.threshold;
        thresholds.push(found);
    }

    ThresholdSearch {
        thresholds,
        baseline_bounds,
        section_thresholds,
    }
}

/// Search a single stretch, relaxing `initial` until a rise onset is found.
pub fn search_section(
    slope: &[f64],
    slope2: &[f64],
    bound: &Bound,
    initial: f64,
) -> PressureThreshold {
    let fallback = PressureThreshold {
        index: bound.start_or_zero(),
        threshold: initial,
    };
    let range = bound.resolve(slope.len().min(slope2.len()));
    if !bound.is_ordered() || range.is_empty() {
        debug!("skipping threshold search over unusable section {:?}", bound);
        return fallback;
    }

    let mut pthresh = initial;
    let mut used = initial;
    let mut passes = 0usize;
    while pthresh > 0.0 {
        used = pthresh;
        passes += 1;
        if let Some(index) = last_rise_onset(slope, slope2, range.clone(), pthresh) {
            debug!(
                "threshold {:.4} found onset {} after {} pass(es)",
                used, index, passes
            );
            return PressureThreshold {
                index,
                threshold: used,
            };
        }
        pthresh -= RELAXATION_STEP;
    }

    warn!(
        "no rise onset in {:?} after {} pass(es); using section start",
        bound, passes
    );
    PressureThreshold {
        index: fallback.index,
        threshold: used,
    }
}

/// Last index in `range` where the second slope reaches `pthresh` on a rise.
///
/// Only the first qualifying sample of each rising excursion counts; the gate
/// re-arms once the slope drops below [`REARM_SLOPE`].
fn last_rise_onset(
    slope: &[f64],
    slope2: &[f64],
    range: Range<usize>,
    pthresh: f64,
) -> Option<usize> {
    let mut allow_hit = true;
    let mut last = None;
    for i in range {
        if slope[i] < REARM_SLOPE {
            allow_hit = true;
        }
        if slope2[i] >= pthresh && slope[i] > 0.0 && allow_hit {
            last = Some(i);
            allow_hit = false;
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_cover_every_baseline_section() {
        let slope2 = [0.0, 0.5, 0.0, -2.0, 1.0, 0.8, 0.0, 0.0];
        let (bounds, thresholds) = section_percentiles(&slope2, &[3], 90.0);
        assert_eq!(
            bounds,
            vec![Bound::new(None, Some(3)), Bound::new(Some(3), None)]
        );
        assert!((thresholds[0] - 0.4).abs() < 1e-12);
        assert!((thresholds[1] - 0.92).abs() < 1e-12);
    }

    #[test]
    fn first_pass_hit_and_relaxed_hit() {
        let slope = [0.0, 1.0, 1.0, -1.0, 0.0, 1.0, 1.0, 1.0];
        let slope2 = [0.0, 0.5, 0.0, -2.0, 1.0, 0.8, 0.0, 0.0];
        let landmarks = Landmarks {
            peaks: vec![2, 7],
            baselines: vec![3],
        };
        let search = find_pressure_thresholds(&slope, &slope2, &landmarks, 90.0);
        assert_eq!(search.indices(), vec![1, 5]);
        assert!((search.thresholds[0].threshold - 0.4).abs() < 1e-12);

        // 0.92 had no hit, relaxation stops at the first value at or below 0.8
        let relaxed = search.thresholds[1].threshold;
        assert!(relaxed <= 0.8 && relaxed > 0.798, "relaxed to {}", relaxed);
        assert_eq!(search.section_thresholds[1], relaxed);
    }

    #[test]
    fn keeps_last_hit_and_rearms_after_flat_slope() {
        let slope = [0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
        let slope2 = [0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
        let landmarks = Landmarks {
            peaks: vec![5],
            baselines: vec![],
        };
        let search = find_pressure_thresholds(&slope, &slope2, &landmarks, 50.0);
        assert_eq!(search.indices(), vec![4]);
    }

    #[test]
    fn exhausted_relaxation_falls_back_to_section_start() {
        let slope = [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let mut slope2 = [-1.0; 10];
        slope2[0] = 0.05;
        let landmarks = Landmarks {
            peaks: vec![9],
            baselines: vec![],
        };
        let search = find_pressure_thresholds(&slope, &slope2, &landmarks, 100.0);
        assert_eq!(search.indices(), vec![0]);
        let last = search.thresholds[0].threshold;
        assert!(last > 0.0 && last <= 0.0011, "last threshold {}", last);
        assert!(last >= -RELAXATION_STEP);
    }

    #[test]
    fn non_positive_threshold_skips_search() {
        let slope = [0.0, 1.0, 1.0];
        let slope2 = [0.0, 0.0, 0.0];
        let found = search_section(&slope, &slope2, &Bound::closed(1, 3), 0.0);
        assert_eq!(found.index, 1);
        assert_eq!(found.threshold, 0.0);
    }

    #[test]
    fn reversed_bound_uses_start() {
        let slope = [0.0, 1.0, 1.0, 1.0];
        let slope2 = [1.0; 4];
        let found = search_section(&slope, &slope2, &Bound::closed(3, 1), 0.5);
        assert_eq!(found.index, 3);
        assert_eq!(found.threshold, 0.5);
    }

    #[test]
    fn one_threshold_per_rise_bound() {
        let slope = [0.0; 12];
        let slope2 = [0.0; 12];
        let landmarks = Landmarks {
            peaks: vec![2, 6, 10],
            baselines: vec![4],
        };
        let search = find_pressure_thresholds(&slope, &slope2, &landmarks, 91.0);
        // bounds: [..2) and [4..6); the third peak has no preceding baseline
        assert_eq!(search.thresholds.len(), 2);
        assert_eq!(search.indices(), vec![0, 4]);
        assert_eq!(search.section_thresholds.len(), 2);
    }
}
