use crate::{
    detectors::{
        empty::find_volume_empty_points, landmarks::detect_landmarks,
        threshold::find_pressure_thresholds,
    },
    error::{CystoError, Result},
    filters::{derivatives, smooth},
    metrics::{
        contraction::{peak_rows, PeakRow},
        volume::{reconstruct_volume, VolumeEvents},
    },
    sections::Bound,
    signal::{Derivatives, Landmarks, PressureThreshold, RawSeries, SmoothedSeries},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable parameters of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Moving-average window, in samples.
    pub moving_avg_window: usize,
    /// Fraction of the pressure range a peak must rise above its surroundings.
    /// Higher values find fewer peaks.
    pub peak_finding_sensitivity: f64,
    /// Percentile of the second slope used as the rise threshold; 85-98 works best.
    pub pressure_threshold_percentile: f64,
    /// Percent of the post-peak pressure drop at which the bladder counts as empty.
    pub volume_empty_percent: f64,
    /// Infusion rate in mL/min.
    pub flow_volume: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            moving_avg_window: 10,
            peak_finding_sensitivity: 0.333,
            pressure_threshold_percentile: 91.0,
            volume_empty_percent: 10.0,
            flow_volume: 1.0,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CystoError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Range checks on every field. `analyze` runs this first, so a zero
    /// `moving_avg_window` surfaces as `InvalidConfig` there; only a direct call to
    /// [`crate::filters::moving_average`] reports `InvalidWindow`.
    pub fn validate(&self) -> Result<()> {
        if self.moving_avg_window < 1 {
            return Err(invalid("moving_avg_window", "must be at least 1"));
        }
        if !self.peak_finding_sensitivity.is_finite() || self.peak_finding_sensitivity < 0.0 {
            return Err(invalid(
                "peak_finding_sensitivity",
                "must be a non-negative number",
            ));
        }
        if !(0.0..=100.0).contains(&self.pressure_threshold_percentile) {
            return Err(invalid(
                "pressure_threshold_percentile",
                "must lie within 0..=100",
            ));
        }
        if !(0.0..=100.0).contains(&self.volume_empty_percent) {
            return Err(invalid("volume_empty_percent", "must lie within 0..=100"));
        }
        if !self.flow_volume.is_finite() || self.flow_volume <= 0.0 {
            return Err(invalid("flow_volume", "must be a positive number"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> CystoError {
    CystoError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

/// Everything derived from one recording by [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub config: AnalysisConfig,
    /// Raw pressure samples, untruncated.
    pub values: Vec<f64>,
    pub smoothed: SmoothedSeries,
    pub derivatives: Derivatives,
    /// Peaks are truncated to the number of pressure thresholds.
    pub landmarks: Landmarks,
    pub pressure_thresholds: Vec<PressureThreshold>,
    pub baseline_bounds: Vec<Bound>,
    pub section_thresholds: Vec<f64>,
    pub volume_empty: Vec<usize>,
    /// Estimated volume aligned with `smoothed.time`.
    pub volume: Vec<f64>,
}

impl AnalysisResult {
    pub fn time(&self) -> &[f64] {
        &self.smoothed.time
    }

    pub fn dt(&self) -> Option<f64> {
        self.smoothed.dt()
    }

    pub fn peaks(&self) -> &[usize] {
        &self.landmarks.peaks
    }

    pub fn baselines(&self) -> &[usize] {
        &self.landmarks.baselines
    }

    pub fn pressure_threshold_indices(&self) -> Vec<usize> {
        self.pressure_thresholds.iter().map(|t| t.index).collect()
    }

    pub fn peak_times(&self) -> Vec<f64> {
        self.times_at(self.peaks())
    }

    pub fn times_at(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&i| self.smoothed.time[i]).collect()
    }

    /// Raw pressure at each index.
    pub fn pressures_at(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&i| self.values[i]).collect()
    }

    pub fn peak_rows(&self) -> Vec<PeakRow> {
        peak_rows(
            &self.smoothed.time,
            &self.values,
            self.peaks(),
            self.baselines(),
            &self.pressure_threshold_indices(),
        )
    }
}

/// Run the full pipeline: smoothing, landmarks, pressure thresholds, empty points, volume.
pub fn analyze(raw: &RawSeries, cfg: &AnalysisConfig) -> Result<AnalysisResult> {
    cfg.validate()?;
    if !raw.is_uniform() {
        warn!("time stamps are not evenly spaced; volume assumes dt = time[1] - time[0]");
    }

    let smoothed = smooth(raw, cfg.moving_avg_window)?;
    let derivatives = derivatives(&smoothed)?;
    let landmarks = detect_landmarks(&smoothed.values, cfg.peak_finding_sensitivity)?;

    let search = find_pressure_thresholds(
        &derivatives.slope,
        &derivatives.slope2,
        &landmarks,
        cfg.pressure_threshold_percentile,
    );
    let volume_empty = find_volume_empty_points(
        &smoothed.values,
        &landmarks.peaks,
        &landmarks.baselines,
        cfg.volume_empty_percent,
    );

    let threshold_indices = search.indices();
    let curve = reconstruct_volume(
        &smoothed.time,
        VolumeEvents {
            peaks: &landmarks.peaks,
            pressure_thresholds: &threshold_indices,
            empty_points: &volume_empty,
            baselines: &landmarks.baselines,
        },
        cfg.flow_volume,
    )?;

    let pressure_thresholds: Vec<PressureThreshold> = search
        .thresholds
        .iter()
        .take(curve.pressure_thresholds.len())
        .copied()
        .collect();

    info!(
        "analysis complete: {} peaks, {} baselines, {} pressure thresholds, {} empty points",
        curve.peaks.len(),
        landmarks.baselines.len(),
        pressure_thresholds.len(),
        volume_empty.len()
    );

    Ok(AnalysisResult {
        config: *cfg,
        values: raw.pressure.clone(),
        smoothed,
        derivatives,
        landmarks: Landmarks {
            peaks: curve.peaks,
            baselines: landmarks.baselines,
        },
        pressure_thresholds,
        baseline_bounds: search.baseline_bounds,
        section_thresholds: search.section_thresholds,
        volume_empty,
        volume: curve.volume,
    })
}
