//! Error types for llyfr-core

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use llyfr_bibtex::ParseError;

/// Result type alias for llyfr operations
pub type Result<T> = std::result::Result<T, LlyfrError>;

/// Step of a library operation, reported with filesystem failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateDirectory,
    ResolvePath,
    CopyDocument,
    AppendRecord,
    ReadBibliography,
    ReadConfig,
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CreateDirectory => "Creating library directory",
            Stage::ResolvePath => "Resolving document path",
            Stage::CopyDocument => "Copying document",
            Stage::AppendRecord => "Appending record",
            Stage::ReadBibliography => "Reading bibliography",
            Stage::ReadConfig => "Reading configuration",
            Stage::Download => "Saving download",
        };
        f.write_str(name)
    }
}

/// Main error type for llyfr operations
#[derive(Error, Debug)]
pub enum LlyfrError {
    /// Missing or blank required input
    #[error("{0}")]
    Validation(String),

    /// Input text holds no recognizable record
    #[error("BibTeX error: {0}")]
    Parse(#[from] ParseError),

    /// Filesystem or stream failure
    #[error("{stage} failed for {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-success status or empty payload from ADS
    #[error("{0}")]
    Remote(String),
}

impl LlyfrError {
    /// Adapter for `map_err` on I/O results
    pub fn io(stage: Stage, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| LlyfrError::Io {
            stage,
            path,
            source,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            LlyfrError::Io { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
