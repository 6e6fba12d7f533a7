use crate::error::{CystoError, Result};
use serde::{Deserialize, Serialize};

/// Relative tolerance used when checking that samples are evenly spaced.
const SAMPLING_TOLERANCE: f64 = 1e-6;

/// Raw cystometry recording: paired time stamps and bladder pressure samples.
///
/// Time is expected to be strictly increasing with a uniform sampling interval.
/// Irregular sampling is not corrected; [`RawSeries::is_uniform`] reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub time: Vec<f64>,
    pub pressure: Vec<f64>,
}

impl RawSeries {
    pub fn new(time: Vec<f64>, pressure: Vec<f64>) -> Result<Self> {
        if time.len() != pressure.len() {
            return Err(CystoError::LengthMismatch {
                time: time.len(),
                pressure: pressure.len(),
            });
        }
        Ok(Self { time, pressure })
    }

    pub fn len(&self) -> usize {
        self.pressure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressure.is_empty()
    }

    /// Sampling interval taken from the first two time stamps.
    pub fn dt(&self) -> Option<f64> {
        sampling_interval(&self.time)
    }

    /// True when every consecutive time step matches the first one.
    pub fn is_uniform(&self) -> bool {
        let Some(dt) = self.dt() else {
            return true;
        };
        let tol = dt.abs().max(f64::EPSILON) * SAMPLING_TOLERANCE;
        self.time.windows(2).all(|w| ((w[1] - w[0]) - dt).abs() <= tol)
    }
}

/// Moving average of the pressure with its time axis truncated to the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSeries {
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

impl SmoothedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dt(&self) -> Option<f64> {
        sampling_interval(&self.time)
    }
}

/// First and (smoothed) second difference of the smoothed pressure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derivatives {
    pub slope: Vec<f64>,
    pub slope2: Vec<f64>,
}

/// Contraction peaks and the baseline valleys between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmarks {
    pub peaks: Vec<usize>,
    pub baselines: Vec<usize>,
}

/// Onset of a pressure rise and the threshold on the second derivative that located it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureThreshold {
    pub index: usize,
    pub threshold: f64,
}

fn sampling_interval(time: &[f64]) -> Option<f64> {
    match time {
        [first, second, ..] => Some(second - first),
        _ => None,
    }
}
