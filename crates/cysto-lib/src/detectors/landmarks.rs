use crate::{
    detectors::peaks::{find_peaks, PeakCriteria},
    error::{CystoError, Result},
    signal::Landmarks,
};
use log::info;

/// Locate contraction peaks and the baselines between them in the smoothed pressure.
///
/// `sensitivity` scales the full pressure range into the prominence a peak or
/// baseline must reach. Baselines must additionally be at least half of the
/// tightest peak spacing apart.
pub fn detect_landmarks(values: &[f64], sensitivity: f64) -> Result<Landmarks> {
    let prominence = required_prominence(values, sensitivity);

    let peaks = find_peaks(
        values,
        &PeakCriteria {
            min_prominence: Some(prominence),
            min_distance: None,
        },
    );
    if peaks.is_empty() {
        return Err(CystoError::NoPeaksFound);
    }

    let inverted: Vec<f64> = values.iter().map(|v| -v).collect();
    let baselines = find_peaks(
        &inverted,
        &PeakCriteria {
            min_prominence: Some(prominence),
            min_distance: baseline_separation(&peaks),
        },
    );

    info!(
        "found {} peaks and {} baselines (prominence {:.4})",
        peaks.len(),
        baselines.len(),
        prominence
    );
    Ok(Landmarks { peaks, baselines })
}

/// `(max - min) * sensitivity` over the series.
pub fn required_prominence(values: &[f64], sensitivity: f64) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if values.is_empty() {
        return 0.0;
    }
    (max - min) * sensitivity
}

/// Half of the smallest gap between consecutive peaks, if there are at least two.
fn baseline_separation(peaks: &[usize]) -> Option<usize> {
    peaks.windows(2).map(|w| w[1] - w[0]).min().map(|gap| gap / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulses(count: usize) -> Vec<f64> {
        let mut out = Vec::new();
        for _ in 0..count {
            out.extend((0..10).map(|k| k as f64));
            out.extend((0..10).map(|k| (10 - k) as f64));
        }
        out.push(0.0);
        out
    }

    #[test]
    fn finds_peaks_and_interior_baselines() {
        let landmarks = detect_landmarks(&pulses(3), 0.5).unwrap();
        assert_eq!(landmarks.peaks, vec![10, 30, 50]);
        assert_eq!(landmarks.baselines, vec![20, 40]);
    }

    #[test]
    fn flat_signal_has_no_peaks() {
        let err = detect_landmarks(&[1.0; 20], 0.3).unwrap_err();
        assert!(matches!(err, CystoError::NoPeaksFound));
    }

    #[test]
    fn single_peak_applies_no_separation() {
        assert_eq!(baseline_separation(&[12]), None);
        assert_eq!(baseline_separation(&[4, 20, 27]), Some(3));
        let landmarks = detect_landmarks(&pulses(1), 0.5).unwrap();
        assert_eq!(landmarks.peaks, vec![10]);
        assert!(landmarks.baselines.is_empty());
    }

    #[test]
    fn prominence_scales_range() {
        assert_eq!(required_prominence(&[1.0, 5.0, 3.0], 0.5), 2.0);
        assert_eq!(required_prominence(&[], 0.5), 0.0);
    }
}
