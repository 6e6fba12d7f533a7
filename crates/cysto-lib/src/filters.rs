use crate::{
    error::{CystoError, Result},
    signal::{Derivatives, RawSeries, SmoothedSeries},
};
use num_traits::Float;

/// Window length of the Savitzky–Golay filter applied to the second difference.
pub const SLOPE2_WINDOW: usize = 9;
/// Polynomial order of the Savitzky–Golay filter applied to the second difference.
pub const SLOPE2_POLYORDER: usize = 4;

/// Simple moving average over the fully overlapping windows only.
///
/// The output has `data.len() - window + 1` samples.
pub fn moving_average<T: Float>(data: &[T], window: usize) -> Result<Vec<T>> {
    if window < 1 || window > data.len() {
        return Err(CystoError::InvalidWindow {
            window,
            len: data.len(),
        });
    }
    if window == 1 {
        return Ok(data.to_vec());
    }
    let scale = T::from(window).ok_or(CystoError::InvalidWindow {
        window,
        len: data.len(),
    })?;
    Ok(data
        .windows(window)
        .map(|w| w.iter().fold(T::zero(), |acc, &x| acc + x) / scale)
        .collect())
}

/// Smooths the pressure and drops the trailing `window - 1` time stamps to match.
pub fn smooth(raw: &RawSeries, window: usize) -> Result<SmoothedSeries> {
    if raw.time.len() != raw.pressure.len() {
        return Err(CystoError::LengthMismatch {
            time: raw.time.len(),
            pressure: raw.pressure.len(),
        });
    }
    let values = moving_average(&raw.pressure, window)?;
    let time = raw.time[..values.len()].to_vec();
    Ok(SmoothedSeries { time, values })
}

/// First difference with the leading element forced to zero, keeping the input length.
pub fn difference(data: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; data.len()];
    for i in 1..data.len() {
        out[i] = data[i] - data[i - 1];
    }
    out
}

/// Slope and noise-suppressed second slope of the smoothed pressure.
pub fn derivatives(smoothed: &SmoothedSeries) -> Result<Derivatives> {
    if smoothed.len() < SLOPE2_WINDOW {
        return Err(CystoError::InsufficientData {
            needed: SLOPE2_WINDOW,
            got: smoothed.len(),
        });
    }
    let slope = difference(&smoothed.values);
    let raw_slope2 = difference(&slope);
    let slope2 = savgol_filter(&raw_slope2, SLOPE2_WINDOW, SLOPE2_POLYORDER)?;
    Ok(Derivatives { slope, slope2 })
}

/// Savitzky–Golay smoothing.
///
/// Interior samples use the centred least-squares weights. The first and last
/// `window / 2` samples are taken from a polynomial fitted to the first and
/// last full window respectively.
pub fn savgol_filter(data: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>> {
    if window % 2 == 0 || polyorder >= window {
        return Err(CystoError::InvalidWindow {
            window,
            len: data.len(),
        });
    }
    if data.len() < window {
        return Err(CystoError::InsufficientData {
            needed: window,
            got: data.len(),
        });
    }
    let fit = PolyFit::new(window, polyorder).ok_or(CystoError::InvalidWindow {
        window,
        len: data.len(),
    })?;
    let half = window / 2;
    let n = data.len();
    let mut out = vec![0.0; n];

    let centre = fit.weights(0.0);
    for i in half..n - half {
        out[i] = dot(&centre, &data[i - half..=i + half]);
    }

    let head = &data[..window];
    let tail = &data[n - window..];
    for offset in 0..half {
        let lead = offset as f64 - half as f64;
        let trail = (offset + 1) as f64;
        out[offset] = dot(&fit.weights(lead), head);
        out[n - half + offset] = dot(&fit.weights(trail), tail);
    }
    Ok(out)
}

fn dot(weights: &[f64], window: &[f64]) -> f64 {
    weights.iter().zip(window).map(|(w, x)| w * x).sum()
}

/// Least-squares polynomial fit over window positions `-half..=half`.
struct PolyFit {
    positions: Vec<f64>,
    /// Inverse of the normal matrix `AᵀA`.
    normal_inv: Vec<Vec<f64>>,
}

impl PolyFit {
    fn new(window: usize, polyorder: usize) -> Option<Self> {
        let half = (window / 2) as f64;
        let positions: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();
        let m = polyorder + 1;
        let mut normal = vec![vec![0.0; m]; m];
        for (p, row) in normal.iter_mut().enumerate() {
            for (q, cell) in row.iter_mut().enumerate() {
                *cell = positions.iter().map(|z| z.powi((p + q) as i32)).sum();
            }
        }
        let normal_inv = invert(normal)?;
        Some(Self {
            positions,
            normal_inv,
        })
    }

    /// Weights that evaluate the fitted polynomial at position `t`.
    fn weights(&self, t: f64) -> Vec<f64> {
        let m = self.normal_inv.len();
        let t_pows: Vec<f64> = (0..m).map(|p| t.powi(p as i32)).collect();
        // c_q = sum_p t^p * inv[p][q]
        let coeffs: Vec<f64> = (0..m)
            .map(|q| (0..m).map(|p| t_pows[p] * self.normal_inv[p][q]).sum())
            .collect();
        self.positions
            .iter()
            .map(|z| {
                coeffs
                    .iter()
                    .enumerate()
                    .map(|(q, c)| c * z.powi(q as i32))
                    .sum()
            })
            .collect()
    }
}

/// Gauss–Jordan inversion with partial pivoting.
fn invert(mut a: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();
    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| {
            a[x][col]
                .abs()
                .partial_cmp(&a[y][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        inv.swap(col, pivot);
        let d = a[col][col];
        for j in 0..n {
            a[col][j] /= d;
            inv[col][j] /= d;
        }
        let (pivot_a, pivot_inv) = (a[col].clone(), inv[col].clone());
        for row in (0..n).filter(|&row| row != col) {
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[row][j] -= factor * pivot_a[j];
                inv[row][j] -= factor * pivot_inv[j];
            }
        }
    }
    Some(inv)
}
