use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the simulation core
///
/// All of them are raised before any owned data is modified.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },
    #[error("Position {position} is not covered by any region (sequence length {length})")]
    PositionOutOfRange { position: usize, length: usize },
    #[error("Cannot compare sequences of unequal length ({left} != {right})")]
    LengthMismatch { left: usize, right: usize },
    #[error("Failed to {goal} after {attempts} attempts")]
    ConstraintUnsatisfiable { goal: &'static str, attempts: usize },
}

impl SimulationError {
    pub fn invalid<S: Into<String>>(name: &'static str, message: S) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("Expected {expected} {location} but observed: {observed}")]
pub struct ParseError {
    expected: &'static str,
    observed: String,
    location: Location,
}

#[derive(Debug)]
pub enum Location {
    Unknown,
    File { path: PathBuf, line: usize },
    Column { name: &'static str, line: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unknown => write!(f, "at unknown location"),
            Location::File { path, line } => {
                write!(f, "in file {} on line {}", path.as_path().display(), line)
            }
            Location::Column { name, line } => {
                write!(f, "in column {} on line {}", name, line)
            }
        }
    }
}

impl ParseError {
    pub fn somewhere(expected: &'static str, observed: String) -> Self {
        Self {
            expected,
            observed,
            location: Location::Unknown,
        }
    }

    pub fn file(path: PathBuf, line: usize, expected: &'static str, observed: String) -> Self {
        let location = Location::File { path, line };
        Self {
            observed,
            expected,
            location,
        }
    }

    pub fn column(
        name: &'static str,
        line: usize,
        expected: &'static str,
        observed: String,
    ) -> Self {
        let location = Location::Column { name, line };
        Self {
            observed,
            expected,
            location,
        }
    }
}

#[derive(Debug, Error)]
pub struct FileError {
    path: Option<PathBuf>,
    #[source]
    source: FileErrorSource,
}

impl FileError {
    fn with_source<P: AsRef<Path>>(path: Option<P>, source: FileErrorSource) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            source,
        }
    }

    pub fn io<P: AsRef<Path>>(path: Option<P>, error: std::io::Error) -> Self {
        Self::with_source(path, error.into())
    }

    pub fn parse<P: AsRef<Path>>(path: Option<P>, error: ParseError) -> Self {
        Self::with_source(path, error.into())
    }

    pub fn json<P: AsRef<Path>>(path: Option<P>, error: serde_json::Error) -> Self {
        Self::with_source(path, error.into())
    }

    pub fn csv<P: AsRef<Path>>(path: Option<P>, error: csv::Error) -> Self {
        Self::with_source(path, error.into())
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "Failed to work with file {}", path.display()),
            None => write!(f, "Failed to work with anonymous file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FileErrorSource {
    #[error("Failed to parse file")]
    Parse {
        #[from]
        source: ParseError,
    },
    #[error("Failed to read/write to file")]
    IO {
        #[from]
        source: std::io::Error,
    },
    #[error("Malformed JSON")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Failed to write tab-separated record")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

/// Catch-all error for top-level API
#[derive(Debug, Error)]
pub enum HybsimError {
    #[error(transparent)]
    SimulationError(#[from] SimulationError),
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    FileError(#[from] FileError),
}
