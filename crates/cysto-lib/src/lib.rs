pub mod analysis;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod sections;
pub mod session;
pub mod signal;

pub use analysis::{analyze, AnalysisConfig, AnalysisResult};
pub use error::{CystoError, Result};
pub use session::{Session, SessionStatus};
pub use signal::*;
