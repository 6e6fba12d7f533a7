use std::path::PathBuf;

/// Errors raised while loading, analysing or exporting a cystometry recording.
#[derive(thiserror::Error, Debug)]
pub enum CystoError {
    #[error("no file selected; call select_file before load")]
    NoFileSelected,
    #[error("no raw data loaded; load a file or set the data before analyzing")]
    NoDataLoaded,
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("time has {time} samples but pressure has {pressure}")]
    LengthMismatch { time: usize, pressure: usize },
    #[error("row {row} is malformed: {reason}")]
    MalformedRow { row: usize, reason: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("window of {window} samples does not fit a series of {len}")]
    InvalidWindow { window: usize, len: usize },
    #[error("need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("no contraction peaks found; try a lower peak finding sensitivity")]
    NoPeaksFound,
    #[error("no analysis result; run analyze first")]
    NoResult,
    #[error("voiding window {index} has zero span")]
    ZeroVoidSlope { index: usize },
    #[error("no voiding window available for void index {index}")]
    MissingVoidSlope { index: usize },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),
}

impl CystoError {
    /// Name of the failure category the error belongs to.
    pub fn category(&self) -> &'static str {
        match self {
            CystoError::NoFileSelected
            | CystoError::NoDataLoaded
            | CystoError::InvalidConfig { .. }
            | CystoError::LengthMismatch { .. }
            | CystoError::Config(_) => "ConfigurationError",
            CystoError::MalformedRow { .. } | CystoError::Csv(_) => "ParseError",
            CystoError::InvalidWindow { .. } | CystoError::InsufficientData { .. } => {
                "InsufficientDataError"
            }
            CystoError::NoPeaksFound => "NoPeaksFoundError",
            CystoError::NoResult => "NoResultError",
            CystoError::ZeroVoidSlope { .. } | CystoError::MissingVoidSlope { .. } => {
                "FatalArithmeticError"
            }
            CystoError::Io { .. } => "IoError",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CystoError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CystoError>;
