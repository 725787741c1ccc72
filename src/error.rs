//! Error types for epubpack operations.

use thiserror::Error;

use crate::model::ResourceKind;
use crate::validate::ValidationError;

/// Errors that can occur while building or packaging a publication.
#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate {kind} filename: {filename}")]
    DuplicateResource {
        kind: ResourceKind,
        filename: String,
    },

    #[error("invalid {kind} content in {filename}: {source}")]
    InvalidContent {
        kind: ResourceKind,
        filename: String,
        #[source]
        source: ValidationError,
    },

    #[error("section {section} references unknown stylesheet {stylesheet}")]
    UnresolvedReference { section: String, stylesheet: String },

    #[error("invalid {kind} filename {filename:?}: {reason}")]
    InvalidFilename {
        kind: ResourceKind,
        filename: String,
        reason: &'static str,
    },

    #[error("{kind} {filename} collides with another file in the package directory")]
    PathConflict {
        kind: ResourceKind,
        filename: String,
    },

    #[error("publication has no sections to put in the spine")]
    EmptySpine,

    #[error("compression level {0} is out of range (1-9)")]
    InvalidCompressionLevel(i64),

    #[error("internal packaging error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;
