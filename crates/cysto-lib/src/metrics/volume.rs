use crate::{
    error::{CystoError, Result},
    sections::{align_length, bound_all, flatten, pair_to_bounds, segment},
};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Event indices the volume curve is built from, all relative to the smoothed series.
#[derive(Debug, Clone, Copy)]
pub struct VolumeEvents<'a> {
    pub peaks: &'a [usize],
    pub pressure_thresholds: &'a [usize],
    pub empty_points: &'a [usize],
    pub baselines: &'a [usize],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeCurve {
    /// Estimated bladder volume (mL) at every time stamp.
    pub volume: Vec<f64>,
    /// Peaks truncated to the number of pressure thresholds.
    pub peaks: Vec<usize>,
    /// Pressure thresholds truncated to the number of peaks.
    pub pressure_thresholds: Vec<usize>,
    /// Time span of every voiding window, in pairing order.
    pub void_spans: Vec<f64>,
}

/// Integrate a synthetic volume curve over `time`.
///
/// Volume grows at `flow_volume` mL/min while inside a filling window
/// (pressure threshold through peak) and drains towards zero inside a voiding
/// window (peak through empty point) at a rate set by the peak volume and the
/// window's span. Filling wins where the two overlap. Each baseline passed
/// advances to the next voiding window's span.
pub fn reconstruct_volume(
    time: &[f64],
    events: VolumeEvents<'_>,
    flow_volume: f64,
) -> Result<VolumeCurve> {
    if time.len() < 2 {
        return Err(CystoError::InsufficientData {
            needed: 2,
            got: time.len(),
        });
    }
    let dt = time[1] - time[0];

    let (peaks, pressure_thresholds) = align_length(events.peaks, events.pressure_thresholds);

    let fill_stops: Vec<usize> = peaks.iter().map(|p| p + 1).collect();
    let fill_bounds = pair_to_bounds(bound_all(&pressure_thresholds), bound_all(&fill_stops));
    let filling: HashSet<u64> = flatten(segment(time, &fill_bounds))
        .into_iter()
        .map(time_key)
        .collect();

    let void_stops: Vec<usize> = events.empty_points.iter().map(|e| e + 1).collect();
    let void_bounds = pair_to_bounds(bound_all(&peaks), bound_all(&void_stops));
    let mut voiding = HashSet::new();
    let mut void_spans = Vec::with_capacity(void_bounds.len());
    for window in segment(time, &void_bounds) {
        let span = match (window.first(), window.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };
        void_spans.push(span);
        voiding.extend(window.into_iter().map(time_key));
    }

    let fill_step = flow_volume / 60.0 * dt;
    let mut volume = Vec::with_capacity(time.len());
    let mut current = 0.0;
    let mut peak_volume = 0.0;
    let mut void_index = 0usize;
    for (i, &t) in time.iter().enumerate() {
        let key = time_key(t);
        if filling.contains(&key) {
            current += fill_step;
            peak_volume = current;
        } else if voiding.contains(&key) && current > 0.0 {
            let span = *void_spans
                .get(void_index)
                .ok_or(CystoError::MissingVoidSlope { index: void_index })?;
            if span == 0.0 {
                return Err(CystoError::ZeroVoidSlope { index: void_index });
            }
            current -= peak_volume / span * dt;
        }

        if events.baselines.binary_search(&i).is_ok() {
            void_index += 1;
        }
        volume.push(current);
    }

    info!(
        "volume reconstructed over {} filling and {} voiding windows",
        fill_bounds.len(),
        void_bounds.len()
    );
    Ok(VolumeCurve {
        volume,
        peaks,
        pressure_thresholds,
        void_spans,
    })
}

/// Hashable identity of a time stamp; `-0.0` and `0.0` map to the same key.
fn time_key(t: f64) -> u64 {
    (t + 0.0).to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn filling_adds_one_per_sample_at_sixty_ml_per_minute() {
        let time = seconds(8);
        let events = VolumeEvents {
            peaks: &[4],
            pressure_thresholds: &[1],
            empty_points: &[],
            baselines: &[],
        };
        let curve = reconstruct_volume(&time, events, 60.0).unwrap();
        assert_eq!(
            curve.volume,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 4.0, 4.0, 4.0]
        );
    }

    #[test]
    fn voiding_drains_back_to_zero() {
        let time = seconds(12);
        let events = VolumeEvents {
            peaks: &[4],
            pressure_thresholds: &[0],
            empty_points: &[9],
            baselines: &[10],
        };
        let curve = reconstruct_volume(&time, events, 60.0).unwrap();
        assert_eq!(curve.void_spans, vec![5.0]);
        assert_eq!(curve.volume[4], 5.0);
        // five voiding samples each remove 5 / 5
        assert!(curve.volume[9].abs() < 1e-9);
        assert!(curve.volume[11].abs() < 1e-9);
        for w in curve.volume[4..=9].windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn surplus_peaks_are_dropped_from_the_end() {
        let time = seconds(10);
        let events = VolumeEvents {
            peaks: &[2, 5, 8],
            pressure_thresholds: &[1, 4],
            empty_points: &[],
            baselines: &[],
        };
        let curve = reconstruct_volume(&time, events, 60.0).unwrap();
        assert_eq!(curve.peaks, vec![2, 5]);
        assert_eq!(curve.pressure_thresholds, vec![1, 4]);
        assert_eq!(curve.volume[9], 4.0);
    }

    #[test]
    fn filling_wins_over_voiding_overlap() {
        let time = seconds(6);
        // voiding window [1, 4] overlaps the second filling window [3, 4]
        let events = VolumeEvents {
            peaks: &[1, 4],
            pressure_thresholds: &[0, 3],
            empty_points: &[4],
            baselines: &[],
        };
        let curve = reconstruct_volume(&time, events, 60.0).unwrap();
        assert_eq!(curve.volume[1], 2.0);
        assert!((curve.volume[2] - (2.0 - 2.0 / 3.0)).abs() < 1e-12);
        assert!(curve.volume[3] > curve.volume[2]);
    }

    #[test]
    fn zero_span_voiding_window_is_fatal() {
        let time = seconds(6);
        let events = VolumeEvents {
            peaks: &[1, 3],
            pressure_thresholds: &[0, 9],
            empty_points: &[1, 3],
            baselines: &[2],
        };
        let err = reconstruct_volume(&time, events, 60.0).unwrap_err();
        assert!(matches!(err, CystoError::ZeroVoidSlope { index: 1 }));
    }

    #[test]
    fn voiding_past_the_last_window_is_fatal() {
        let time = seconds(4);
        let events = VolumeEvents {
            peaks: &[1],
            pressure_thresholds: &[0],
            empty_points: &[2],
            baselines: &[0],
        };
        let err = reconstruct_volume(&time, events, 60.0).unwrap_err();
        assert!(matches!(err, CystoError::MissingVoidSlope { index: 1 }));
    }

    #[test]
    fn needs_two_time_stamps() {
        let events = VolumeEvents {
            peaks: &[],
            pressure_thresholds: &[],
            empty_points: &[],
            baselines: &[],
        };
        assert!(matches!(
            reconstruct_volume(&[0.0], events, 1.0),
            Err(CystoError::InsufficientData { needed: 2, got: 1 })
        ));
    }
}
