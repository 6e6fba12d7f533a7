//! Helpers for cutting index-aligned series into sections.
//!
//! A [`Bound`] behaves like a half-open slice whose ends may be left open: an
//! open start means "from the beginning", an open stop means "to the end".

use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub start: Option<usize>,
    pub stop: Option<usize>,
}

impl Bound {
    pub fn new(start: Option<usize>, stop: Option<usize>) -> Self {
        Self { start, stop }
    }

    pub fn closed(start: usize, stop: usize) -> Self {
        Self::new(Some(start), Some(stop))
    }

    /// Absolute index of the first element, treating an open start as zero.
    pub fn start_or_zero(&self) -> usize {
        self.start.unwrap_or(0)
    }

    /// False when both ends are bound and the start lies past the stop.
    pub fn is_ordered(&self) -> bool {
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => start <= stop,
            _ => true,
        }
    }

    /// Concrete index range for an array of `len` elements, clamped like a slice.
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let stop = self.stop.unwrap_or(len).min(len);
        let start = self.start_or_zero().min(stop);
        start..stop
    }

    pub fn slice<'a, T>(&self, array: &'a [T]) -> &'a [T] {
        &array[self.resolve(array.len())]
    }
}

/// Yields a copy of `array[bound]` for every bound, in order.
pub fn segment<'a, T: Clone>(
    array: &'a [T],
    bounds: &'a [Bound],
) -> impl Iterator<Item = Vec<T>> + 'a {
    bounds.iter().map(move |bound| bound.slice(array).to_vec())
}

/// Zips starts and stops into bounds; surplus entries of the longer side are dropped.
pub fn pair_to_bounds<S, E>(starts: S, stops: E) -> Vec<Bound>
where
    S: IntoIterator<Item = Option<usize>>,
    E: IntoIterator<Item = Option<usize>>,
{
    starts
        .into_iter()
        .zip(stops)
        .map(|(start, stop)| Bound::new(start, stop))
        .collect()
}

/// `[None, Some(i0), Some(i1), ...]`: the indices preceded by an open end.
pub fn open_then<'a>(indices: &'a [usize]) -> impl Iterator<Item = Option<usize>> + 'a {
    std::iter::once(None).chain(indices.iter().copied().map(Some))
}

/// `[Some(i0), Some(i1), ..., None]`: the indices followed by an open end.
pub fn then_open<'a>(indices: &'a [usize]) -> impl Iterator<Item = Option<usize>> + 'a {
    indices
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::once(None))
}

pub fn bound_all<'a>(indices: &'a [usize]) -> impl Iterator<Item = Option<usize>> + 'a {
    indices.iter().copied().map(Some)
}

/// Truncates the longer sequence from the end so both match the shorter length.
pub fn align_length<A: Clone, B: Clone>(a: &[A], b: &[B]) -> (Vec<A>, Vec<B>) {
    let n = a.len().min(b.len());
    (a[..n].to_vec(), b[..n].to_vec())
}

pub fn flatten<T, I, J>(nested: I) -> Vec<T>
where
    I: IntoIterator<Item = J>,
    J: IntoIterator<Item = T>,
{
    let mut out = Vec::new();
    for part in nested {
        out.extend(part);
    }
    out
}

/// Percentile with linear interpolation between the closest ranks.
///
/// Returns `None` for an empty input. `q` is clamped to `[0, 100]`.
pub fn percentile<T: Float>(values: &[T], q: T) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let hundred = T::from(100.0)?;
    let q = q.max(T::zero()).min(hundred);
    let last = T::from(sorted.len() - 1)?;
    let rank = q / hundred * last;
    let lo = rank.floor();
    let lo_idx = lo.to_usize()?;
    let hi_idx = (lo_idx + 1).min(sorted.len() - 1);
    let frac = rank - lo;
    let (a, b) = (sorted[lo_idx], sorted[hi_idx]);
    let half = T::from(0.5)?;
    if frac >= half {
        Some(b - (b - a) * (T::one() - frac))
    } else {
        Some(a + (b - a) * frac)
    }
}
