use nom::error::{ErrorKind, ParseError};

use crate::pdf::trailer::TrailerError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CbParseErrorKind {
    #[error("invalid trailer: {0}")]
    InvalidTrailer(#[from] TrailerError),
    #[error("startxref does not point into the file")]
    StartxrefInvalid,
    #[error("marker not found near the end of the file")]
    BackwardSearchNotFound,
    #[error("malformed cross-reference table")]
    XrefInvalid,
    #[error("cross-reference streams are not supported")]
    XrefStreamUnsupported,
    #[error("stream length is not a direct integer")]
    StreamLengthUnknown,
    #[error("unexpected syntax ({0:?})")]
    Nom(ErrorKind),
}

/// Parse error at `input`. `cause` holds the error that made the parser
/// give up, if it failed because an inner parser did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbParseError<I> {
    pub input: I,
    pub kind: CbParseErrorKind,
    pub cause: Option<Box<Self>>,
}

impl<I> CbParseError<I> {
    pub fn new(input: I, kind: CbParseErrorKind) -> Self {
        Self {
            input,
            kind,
            cause: None,
        }
    }

    pub fn caused_by(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The innermost error of the chain.
    pub fn root(&self) -> &Self {
        let mut err = self;
        while let Some(cause) = &err.cause {
            err = cause;
        }
        err
    }
}

impl<I> ParseError<I> for CbParseError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        Self::new(input, CbParseErrorKind::Nom(kind))
    }

    /// Errors of our own kinds say more than the nom combinator that passed
    /// them on, so they are kept as they are.
    fn append(input: I, kind: ErrorKind, other: Self) -> Self {
        match other.kind {
            CbParseErrorKind::Nom(_) => Self::new(input, CbParseErrorKind::Nom(kind)).caused_by(other),
            _ => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_kinds_survive_append() {
        let inner = CbParseError::new(3, CbParseErrorKind::XrefInvalid);
        let appended = CbParseError::append(1, ErrorKind::Alt, inner.clone());
        assert_eq!(appended, inner);

        let nom = CbParseError::from_error_kind(5, ErrorKind::Digit);
        let appended = CbParseError::append(2, ErrorKind::Many1, nom);
        assert_eq!(appended.kind, CbParseErrorKind::Nom(ErrorKind::Many1));
        assert_eq!(appended.root().input, 5);
    }
}
