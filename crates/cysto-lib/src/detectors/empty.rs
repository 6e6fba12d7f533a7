use crate::sections::{bound_all, pair_to_bounds, segment};
use log::warn;

/// Points after each peak where the bladder is considered empty.
///
/// Peaks are paired positionally with baselines. Within `values[peak..=baseline]`
/// the empty point is the first sample below `percent`% of the pressure drop
/// above the section's final value. Pairs with an empty section or no
/// qualifying sample contribute nothing.
pub fn find_volume_empty_points(
    values: &[f64],
    peaks: &[usize],
    baselines: &[usize],
    percent: f64,
) -> Vec<usize> {
    let stops: Vec<usize> = baselines.iter().map(|b| b + 1).collect();
    let bounds = pair_to_bounds(bound_all(peaks), bound_all(&stops));

    let mut out = Vec::new();
    for (&peak, section) in peaks.iter().zip(segment(values, &bounds)) {
        let (Some(&first), Some(&last)) = (section.first(), section.last()) else {
            continue;
        };
        let cutoff = percent / 100.0 * (first - last) + last;
        match section.iter().position(|&v| v < cutoff) {
            Some(offset) => out.push(peak + offset),
            None => warn!("no volume empty point after peak {}", peak),
        }
    }
    out
}
