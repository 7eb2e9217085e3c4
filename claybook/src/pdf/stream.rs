use super::{Bytes, Dictionary};

/// A stream dictionary together with its (already filtered) payload. The
/// `/Length` entry is filled in by the encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Stream {
    pub dictionary: Dictionary,
    pub data: Bytes,
}

impl Stream {
    pub fn new(dictionary: Dictionary, data: impl Into<Bytes>) -> Self {
        Self {
            dictionary,
            data: data.into(),
        }
    }
}
