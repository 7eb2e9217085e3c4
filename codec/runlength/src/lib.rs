//! PackBits run-length coding as used by the PDF `RunLengthDecode` filter.
//!
//! Every run starts with a length byte `L`:
//! * `0..=127`: the next `L + 1` bytes are copied literally.
//! * `129..=255`: the next byte is repeated `257 - L` times.
//! * `128`: end of data.

use std::fmt::Display;

/// End-of-data marker.
pub const EOD: u8 = 128;

/// Longest run (literal or repeated) a single length byte can describe.
const MAX_RUN: usize = 128;

/// Repeated runs shorter than this are folded into literal runs.
const MIN_REPEAT_INSIDE_LITERAL: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The length byte at `position` announces more bytes than are available.
    UnexpectedEnd { position: usize },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnexpectedEnd { position } => {
                write!(f, "run starting at byte {} exceeds the input", position)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

fn repeated_prefix(data: &[u8]) -> usize {
    match data.first() {
        Some(first) => data.iter().take(MAX_RUN).take_while(|&b| b == first).count(),
        None => 0,
    }
}

/// Encode `input` and terminate the output with [`EOD`].
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / MAX_RUN + 2);
    let mut pos = 0;

    while pos < input.len() {
        let run = repeated_prefix(&input[pos..]);
        if run >= 2 {
            out.push((257 - run) as u8);
            out.push(input[pos]);
            pos += run;
            continue;
        }

        let start = pos;
        let mut end = pos + 1;
        while end < input.len()
            && end - start < MAX_RUN
            && repeated_prefix(&input[end..]) < MIN_REPEAT_INSIDE_LITERAL
        {
            end += 1;
        }
        out.push((end - start - 1) as u8);
        out.extend_from_slice(&input[start..end]);
        pos = end;
    }

    out.push(EOD);
    out
}

/// Decode `input` up to the [`EOD`] marker or the end of the slice, whichever
/// comes first.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut pos = 0;

    while let Some(&length) = input.get(pos) {
        match length {
            EOD => break,
            0..=127 => {
                let count = usize::from(length) + 1;
                let literal = input
                    .get(pos + 1..pos + 1 + count)
                    .ok_or(DecodeError::UnexpectedEnd { position: pos })?;
                out.extend_from_slice(literal);
                pos += 1 + count;
            }
            _ => {
                let count = 257 - usize::from(length);
                let &byte = input.get(pos + 1).ok_or(DecodeError::UnexpectedEnd { position: pos })?;
                out.resize(out.len() + count, byte);
                pos += 2;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(encode(b""), vec![EOD]);
        assert_eq!(decode(&[EOD]), Ok(vec![]));
    }

    #[test]
    fn repeated_bytes() {
        let encoded = encode(&[7u8; 10]);
        assert_eq!(encoded, vec![247, 7, EOD]);
        assert_eq!(decode(&encoded).unwrap(), vec![7u8; 10]);
    }

    #[test]
    fn literal_bytes() {
        let encoded = encode(b"abcdef");
        assert_eq!(encoded, [&[5u8][..], b"abcdef", &[EOD]].concat());
    }

    #[test]
    fn long_run_is_split() {
        let input = vec![0u8; 300];
        let encoded = encode(&input);
        // 128 + 128 + 44
        assert_eq!(encoded, vec![129, 0, 129, 0, 213, 0, EOD]);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn mixed_content() {
        let input = b"xyzzzzzzzab\x00\x00\x01".to_vec();
        let encoded = encode(&input);
        assert!(encoded.len() < input.len() + 4);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn long_literal_is_split() {
        let input: Vec<u8> = (0..=255u8).cycle().take(400).collect();
        let encoded = encode(&input);
        assert_eq!(encoded[0], 127);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn missing_eod_is_accepted() {
        assert_eq!(decode(&[2, b'a', b'b', b'c']), Ok(b"abc".to_vec()));
    }

    #[test]
    fn truncated_literal() {
        assert_eq!(
            decode(&[4, b'a', b'b']),
            Err(DecodeError::UnexpectedEnd { position: 0 })
        );
        assert_eq!(decode(&[1, b'a', b'b', 200]), Err(DecodeError::UnexpectedEnd { position: 3 }));
    }
}
