use crate::{
    analysis::AnalysisResult,
    error::{CystoError, Result},
    metrics::contraction::PeakRow,
};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

pub const BASELINES_FILE: &str = "baselines.csv";
pub const THRESHOLDS_FILE: &str = "threshold_pressures.csv";
pub const VOLUME_FILE: &str = "volume.csv";
pub const PEAKS_FILE: &str = "peaks.csv";

const PRESSURE_HEADER: &[&str] = &["time", "bladder_p"];
const VOLUME_HEADER: &[&str] = &["time", "volume"];
const PEAKS_HEADER: &[&str] = &["time", "bladder_p", "ici", "cd"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureRow {
    pub time: f64,
    pub bladder_p: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeRow {
    pub time: f64,
    pub volume: f64,
}

/// Paths written by [`export`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFiles {
    pub baselines: PathBuf,
    pub thresholds: PathBuf,
    pub volume: PathBuf,
    pub peaks: PathBuf,
}

/// Write baselines, pressure thresholds, volume and peaks as CSV files into `dir`.
///
/// Every file name is prefixed with `prefix`. The directory must already exist.
pub fn export(result: &AnalysisResult, dir: &Path, prefix: &str) -> Result<ExportedFiles> {
    let files = ExportedFiles {
        baselines: dir.join(format!("{prefix}{BASELINES_FILE}")),
        thresholds: dir.join(format!("{prefix}{THRESHOLDS_FILE}")),
        volume: dir.join(format!("{prefix}{VOLUME_FILE}")),
        peaks: dir.join(format!("{prefix}{PEAKS_FILE}")),
    };

    write_rows(
        &files.baselines,
        PRESSURE_HEADER,
        pressure_rows(result, result.baselines()),
    )?;
    write_rows(
        &files.thresholds,
        PRESSURE_HEADER,
        pressure_rows(result, &result.pressure_threshold_indices()),
    )?;
    write_rows(
        &files.volume,
        VOLUME_HEADER,
        result
            .time()
            .iter()
            .zip(&result.volume)
            .map(|(&time, &volume)| VolumeRow { time, volume }),
    )?;
    write_rows(&files.peaks, PEAKS_HEADER, result.peak_rows())?;

    info!("exported analysis to {}", dir.display());
    Ok(files)
}

/// Read a `peaks.csv` file back into rows.
pub fn read_peaks_csv(path: &Path) -> Result<Vec<PeakRow>> {
    let file = File::open(path).map_err(|e| CystoError::io(path, e))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn pressure_rows<'a>(
    result: &'a AnalysisResult,
    indices: &'a [usize],
) -> impl Iterator<Item = PressureRow> + 'a {
    indices.iter().map(|&i| PressureRow {
        time: result.time()[i],
        bladder_p: result.values[i],
    })
}

/// Writes `header` first, even when there are no rows.
fn write_rows<T, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(path).map_err(|e| CystoError::io(path, e))?;
    let mut writer: Writer<File> = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| CystoError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{analyze, AnalysisConfig},
        signal::RawSeries,
    };

    fn analysed() -> AnalysisResult {
        let mut pressure = Vec::new();
        for _ in 0..3 {
            pressure.extend((0..10).map(|k| k as f64));
            pressure.extend((0..10).map(|k| (10 - k) as f64));
        }
        pressure.push(0.0);
        let time = (0..pressure.len()).map(|i| i as f64 * 0.5).collect();
        let raw = RawSeries::new(time, pressure).unwrap();
        let cfg = AnalysisConfig {
            moving_avg_window: 2,
            peak_finding_sensitivity: 0.5,
            pressure_threshold_percentile: 90.0,
            volume_empty_percent: 10.0,
            flow_volume: 60.0,
        };
        analyze(&raw, &cfg).unwrap()
    }

    #[test]
    fn peaks_round_trip_through_csv() {
        let result = analysed();
        let dir = tempfile::tempdir().unwrap();
        let files = export(&result, dir.path(), "run1_").unwrap();
        assert!(files.peaks.ends_with("run1_peaks.csv"));

        let rows = read_peaks_csv(&files.peaks).unwrap();
        assert_eq!(rows.len(), result.peaks().len());
        let expected: Vec<(f64, f64)> = result
            .peak_times()
            .into_iter()
            .zip(result.pressures_at(result.peaks()))
            .collect();
        let actual: Vec<(f64, f64)> = rows.iter().map(|r| (r.time, r.bladder_p)).collect();
        assert_eq!(actual, expected);
        assert_eq!(rows[0].ici, None);
        assert_eq!(rows[1].ici, Some(10.0));
    }

    #[test]
    fn writes_every_file_with_headers() {
        let result = analysed();
        let dir = tempfile::tempdir().unwrap();
        let files = export(&result, dir.path(), "").unwrap();

        let baselines = std::fs::read_to_string(&files.baselines).unwrap();
        let mut lines = baselines.lines();
        assert_eq!(lines.next(), Some("time,bladder_p"));
        assert_eq!(lines.count(), result.baselines().len());

        let volume = std::fs::read_to_string(&files.volume).unwrap();
        assert_eq!(volume.lines().next(), Some("time,volume"));
        assert_eq!(volume.lines().count(), result.volume.len() + 1);

        let thresholds = std::fs::read_to_string(&files.thresholds).unwrap();
        assert_eq!(
            thresholds.lines().count(),
            result.pressure_thresholds.len() + 1
        );
        let peaks = std::fs::read_to_string(&files.peaks).unwrap();
        assert_eq!(peaks.lines().next(), Some("time,bladder_p,ici,cd"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let result = analysed();
        let dir = tempfile::tempdir().unwrap();
        let err = export(&result, &dir.path().join("absent"), "").unwrap_err();
        assert!(matches!(err, CystoError::Io { .. }));
    }
}
