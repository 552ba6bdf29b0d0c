//! Error taxonomy for the conversion pipeline.
//!
//! Every variant that can abort a file carries the file name and the
//! offending value so a failed batch entry can be diagnosed from the log
//! line alone.
use std::path::PathBuf;

use thiserror::Error;

use crate::annotation::LabelCode;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// The configuration does not fit the file (missing channels, unmapped
    /// naming convention, unsupported filter or ERSP parameters).
    #[error("configuration error for {file}: {message}")]
    Configuration { file: String, message: String },

    /// An accepted label code has no entry in the label map.
    #[error("label code {code} accepted but missing from the label map ({file})")]
    Lookup { file: String, code: LabelCode },

    /// The recording decoded but its content cannot be processed as-is.
    #[error("malformed recording {file}: {message}")]
    MalformedRecording { file: String, message: String },

    /// The binary decoder failed.
    #[error("failed to read {}: {source:#}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported recording format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to encode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ConvertError {
    pub fn configuration(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration { file: file.into(), message: message.into() }
    }

    pub fn malformed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecording { file: file.into(), message: message.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Short machine-friendly category, used in the batch summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::InvalidConfig(_) => "configuration",
            Self::Lookup { .. } => "lookup",
            Self::MalformedRecording { .. } => "malformed-recording",
            Self::Read { .. } | Self::UnsupportedFormat(_) => "read",
            Self::Image { .. } => "image",
            Self::Io { .. } => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
