use std::{io, path::PathBuf};

use crate::parse::{error::CbParseError, Span};

pub type Result<T, E = CbError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum CbError {
    /// The decoded pixel format has no encoding policy.
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// The source image could not be decoded, even with truncation recovery.
    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// The image codec is not compiled in.
    #[error("missing optional dependency: {0}")]
    MissingOptionalDependency(&'static str),

    /// Object bookkeeping was violated. Always a bug.
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    /// The file to append to cannot be understood.
    #[error("invalid existing PDF: {0}")]
    InvalidExistingPdf(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CbError {
    /// Errors that must end the whole run instead of a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CbError::MissingOptionalDependency(_) | CbError::InternalConsistency(_)
        )
    }
}

impl From<nom::Err<CbParseError<Span<'_>>>> for CbError {
    fn from(err: nom::Err<CbParseError<Span<'_>>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => CbError::InvalidExistingPdf("unexpected end of file".to_owned()),
            nom::Err::Error(err) | nom::Err::Failure(err) => CbError::InvalidExistingPdf(format!(
                "{} at byte {}",
                err.kind,
                err.input.location_offset()
            )),
        }
    }
}
