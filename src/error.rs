//! Crate-level error types.

use std::fmt;

/// Errors produced by the fieldlines crate.
#[derive(Debug)]
pub enum FieldlinesError {
    /// Generic I/O failure.
    Io(std::io::Error),
    /// The binary state file carries a version this build cannot read.
    UnsupportedVersion {
        /// Version number found in the file header.
        found: i32,
    },
    /// A state file was truncated or its contents contradict its header.
    MalformedFile(String),
    /// JSON parsing/serialization failure.
    Json(serde_json::Error),
    /// A timestamp could not be parsed or represented.
    InvalidTime(String),
    /// Seed point file has the wrong type or an unparsable line.
    SeedFile(String),
    /// The tracing source comes from a model that is not supported.
    UnsupportedModel(String),
    /// The requested tracing variable is not supported.
    UnsupportedVariable(String),
    /// The tracing collaborator failed to produce usable data.
    Tracing(String),
    /// A source directory is missing or holds no usable files.
    NoSourceFiles(String),
    /// A matching pair index does not exist in the state.
    PairIndexOutOfRange {
        /// Requested pair index.
        index: usize,
        /// Number of pairs in the state.
        len: usize,
    },
    /// A path line needs at least two key frames to be traversed.
    TooFewKeyFrames {
        /// Number of key frames on the offending path line.
        found: usize,
    },
    /// The state violates one of its structural invariants.
    InconsistentState(String),
    /// Failed to spawn a background thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Background ingestion was cancelled before it finished.
    Cancelled,
}

impl fmt::Display for FieldlinesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported state file version {found}")
            }
            Self::MalformedFile(msg) => write!(f, "malformed state file: {msg}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::InvalidTime(msg) => write!(f, "invalid time: {msg}"),
            Self::SeedFile(msg) => write!(f, "seed point file error: {msg}"),
            Self::UnsupportedModel(msg) => {
                write!(f, "unsupported model: {msg}")
            }
            Self::UnsupportedVariable(msg) => {
                write!(f, "unsupported tracing variable: {msg}")
            }
            Self::Tracing(msg) => write!(f, "tracing error: {msg}"),
            Self::NoSourceFiles(msg) => write!(f, "no source files: {msg}"),
            Self::PairIndexOutOfRange { index, len } => write!(
                f,
                "matching pair index {index} out of range ({len} pairs)"
            ),
            Self::TooFewKeyFrames { found } => write!(
                f,
                "path line has {found} key frames, at least 2 are required"
            ),
            Self::InconsistentState(msg) => {
                write!(f, "inconsistent fieldlines state: {msg}")
            }
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Cancelled => write!(f, "ingestion was cancelled"),
        }
    }
}

impl std::error::Error for FieldlinesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FieldlinesError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for FieldlinesError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
