/// Constraints applied by [`find_peaks`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakCriteria {
    /// Minimum height above the higher of the two flanking minima.
    pub min_prominence: Option<f64>,
    /// Minimum index separation; lower peaks closer than this to a higher one are dropped.
    pub min_distance: Option<usize>,
}

/// Find local maxima that satisfy `criteria`, returned in ascending index order.
///
/// Flat tops count as one peak located at the (rounded down) middle of the plateau.
/// Samples at either end of the series are never peaks.
pub fn find_peaks(data: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    let mut peaks = local_maxima(data);

    if let Some(distance) = criteria.min_distance.filter(|&d| d > 1) {
        peaks = select_by_distance(data, &peaks, distance);
    }

    if let Some(min_prominence) = criteria.min_prominence {
        peaks.retain(|&peak| prominence(data, peak) >= min_prominence);
    }
    peaks
}

/// Midpoints of every strict local maximum or flat-topped plateau.
pub fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut out = Vec::new();
    if data.len() < 3 {
        return out;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                out.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    out
}

/// Height of `data[peak]` above the higher of its two bases.
///
/// Each base is the minimum reached walking outwards until a strictly higher
/// sample or the end of the series.
pub fn prominence(data: &[f64], peak: usize) -> f64 {
    let height = data[peak];

    let mut left_min = height;
    for &value in data[..=peak].iter().rev() {
        if value > height {
            break;
        }
        left_min = left_min.min(value);
    }

    let mut right_min = height;
    for &value in &data[peak..] {
        if value > height {
            break;
        }
        right_min = right_min.min(value);
    }

    height - left_min.max(right_min)
}

/// Keeps the highest peaks first, discarding neighbours closer than `distance`.
fn select_by_distance(data: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        data[peaks[a]]
            .partial_cmp(&data[peaks[b]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_strict_maxima_and_plateau_midpoints() {
        let data = [0.0, 2.0, 1.0, 3.0, 3.0, 3.0, 1.0, 5.0];
        assert_eq!(local_maxima(&data), vec![1, 4]);
    }

    #[test]
    fn ignores_rising_edge_into_plateau_that_keeps_rising() {
        let data = [0.0, 1.0, 1.0, 2.0, 0.0];
        assert_eq!(local_maxima(&data), vec![3]);
    }

    #[test]
    fn prominence_uses_higher_base() {
        let data = [0.0, 4.0, 2.0, 6.0, 1.0];
        assert_eq!(prominence(&data, 1), 2.0);
        assert_eq!(prominence(&data, 3), 6.0 - 1.0_f64.max(0.0));
    }

    #[test]
    fn prominence_walks_across_equal_peaks() {
        let data = [0.0, 5.0, 1.0, 5.0, 2.0];
        assert_eq!(prominence(&data, 1), 5.0 - 0.0_f64.max(1.0));
    }

    #[test]
    fn filters_by_prominence() {
        let data = [0.0, 4.0, 3.5, 4.2, 0.0, 8.0, 0.0];
        let criteria = PeakCriteria {
            min_prominence: Some(2.0),
            min_distance: None,
        };
        assert_eq!(find_peaks(&data, &criteria), vec![3, 5]);
    }

    #[test]
    fn distance_keeps_higher_neighbour() {
        let data = [0.0, 3.0, 0.0, 5.0, 0.0, 2.0, 0.0, 0.0, 4.0, 0.0];
        let criteria = PeakCriteria {
            min_prominence: None,
            min_distance: Some(3),
        };
        assert_eq!(find_peaks(&data, &criteria), vec![3, 8]);
    }
}
