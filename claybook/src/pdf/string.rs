use std::ops::Deref;

use chrono::{DateTime, Utc};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CbString(Vec<u8>);

impl CbString {
    /// Encode text for use as a PDF text string: ASCII stays as is, anything
    /// else becomes UTF-16BE with a byte order mark.
    pub fn text(s: &str) -> Self {
        if s.is_ascii() {
            return CbString(s.as_bytes().to_vec());
        }
        let mut bytes = vec![0xfe, 0xff];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        CbString(bytes)
    }

    /// `D:YYYYMMDDHHmmSSZ`
    pub fn date(date: &DateTime<Utc>) -> Self {
        CbString(date.format("D:%Y%m%d%H%M%SZ").to_string().into_bytes())
    }

    /// Inverse of [`CbString::text`]. Bytes that are neither UTF-16BE with a
    /// BOM nor valid UTF-8 are decoded lossily.
    pub fn to_text(&self) -> String {
        if let [0xfe, 0xff, rest @ ..] = &self.0[..] {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            return String::from_utf16_lossy(&units);
        }
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<Vec<u8>> for CbString {
    fn from(v: Vec<u8>) -> Self {
        CbString(v)
    }
}

impl From<&[u8]> for CbString {
    fn from(v: &[u8]) -> Self {
        CbString(v.to_vec())
    }
}

impl Deref for CbString {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for CbString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CbString")
            .field(&String::from_utf8_lossy(&self.0[..]))
            .finish()
    }
}

impl std::fmt::Display for CbString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.to_text())
    }
}
