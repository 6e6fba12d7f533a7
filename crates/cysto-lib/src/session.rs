//! Stateful front end tying loading, analysis and export together.
//!
//! ```text
//! Empty --select_file--> FileSelected --load--> Loaded --analyze--> Analyzed
//!   \________________set_raw_data_______________> DataSet --analyze--^
//! ```
//!
//! `select_file` always clears loaded data and results. Every other failing
//! call leaves the session exactly as it was.

use crate::{
    analysis::{analyze, AnalysisConfig, AnalysisResult},
    error::{CystoError, Result},
    io::{
        csv::{read_raw_series, LoadOptions},
        export::{export, ExportedFiles},
    },
    signal::RawSeries,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Empty,
    FileSelected,
    Loaded,
    DataSet,
    Analyzed,
}

#[derive(Debug, Clone, Default)]
enum SessionState {
    #[default]
    Empty,
    FileSelected {
        path: PathBuf,
    },
    Loaded {
        path: PathBuf,
        raw: RawSeries,
    },
    DataSet {
        path: Option<PathBuf>,
        raw: RawSeries,
    },
    Analyzed {
        path: Option<PathBuf>,
        raw: RawSeries,
        result: Box<AnalysisResult>,
    },
}

impl SessionState {
    fn path(&self) -> Option<&PathBuf> {
        match self {
            SessionState::Empty => None,
            SessionState::FileSelected { path } | SessionState::Loaded { path, .. } => Some(path),
            SessionState::DataSet { path, .. } | SessionState::Analyzed { path, .. } => {
                path.as_ref()
            }
        }
    }

    fn raw(&self) -> Option<&RawSeries> {
        match self {
            SessionState::Loaded { raw, .. }
            | SessionState::DataSet { raw, .. }
            | SessionState::Analyzed { raw, .. } => Some(raw),
            _ => None,
        }
    }

    fn into_parts(self) -> (Option<PathBuf>, Option<RawSeries>) {
        match self {
            SessionState::Empty => (None, None),
            SessionState::FileSelected { path } => (Some(path), None),
            SessionState::Loaded { path, raw } => (Some(path), Some(raw)),
            SessionState::DataSet { path, raw } | SessionState::Analyzed { path, raw, .. } => {
                (path, Some(raw))
            }
        }
    }
}

/// Holds at most one recording and at most one analysis of it.
///
/// Calls chain, e.g.
/// `session.select_file(path).load(&opts)?.analyze(&cfg)?.export(dir, "a1_")?`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let mut session = Self::new();
        session.select_file(path);
        session
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Empty => SessionStatus::Empty,
            SessionState::FileSelected { .. } => SessionStatus::FileSelected,
            SessionState::Loaded { .. } => SessionStatus::Loaded,
            SessionState::DataSet { .. } => SessionStatus::DataSet,
            SessionState::Analyzed { .. } => SessionStatus::Analyzed,
        }
    }

    /// Choose the recording to load, discarding any loaded data and results.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.state = SessionState::FileSelected { path: path.into() };
        self
    }

    /// Supply samples directly instead of loading a file. Any result is discarded.
    pub fn set_raw_data(&mut self, time: Vec<f64>, pressure: Vec<f64>) -> Result<&mut Self> {
        let raw = RawSeries::new(time, pressure)?;
        let path = self.state.path().cloned();
        self.state = SessionState::DataSet { path, raw };
        Ok(self)
    }

    /// Parse the selected file. Requires a non-empty selected path; replaces any data and result.
    pub fn load(&mut self, opts: &LoadOptions) -> Result<&mut Self> {
        let path = self
            .state
            .path()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(CystoError::NoFileSelected)?;
        let raw = read_raw_series(path, opts)?;
        let path = path.clone();
        self.state = SessionState::Loaded { path, raw };
        Ok(self)
    }

    /// Analyze the current data, replacing any previous result.
    pub fn analyze(&mut self, cfg: &AnalysisConfig) -> Result<&mut Self> {
        let raw = self.state.raw().ok_or(CystoError::NoDataLoaded)?;
        let result = analyze(raw, cfg)?;
        let (path, raw) = std::mem::take(&mut self.state).into_parts();
        let raw = raw.ok_or(CystoError::NoDataLoaded)?;
        self.state = SessionState::Analyzed {
            path,
            raw,
            result: Box::new(result),
        };
        Ok(self)
    }

    pub fn result(&self) -> Result<&AnalysisResult> {
        match &self.state {
            SessionState::Analyzed { result, .. } => Ok(result.as_ref()),
            _ => Err(CystoError::NoResult),
        }
    }

    /// Export the current result; see [`crate::io::export::export`].
    pub fn export(&self, dir: &Path, prefix: &str) -> Result<ExportedFiles> {
        export(self.result()?, dir, prefix)
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.state.path().map(PathBuf::as_path)
    }

    pub fn has_file(&self) -> bool {
        self.file_path()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    pub fn is_loaded(&self) -> bool {
        self.state.raw().is_some()
    }

    pub fn has_result(&self) -> bool {
        matches!(self.state, SessionState::Analyzed { .. })
    }

    pub fn raw(&self) -> Option<&RawSeries> {
        self.state.raw()
    }
}
