use nom::{branch, bytes, character, combinator, multi, sequence};
use nom_tracable::tracable_parser;

use super::{
    backward_search,
    error::{CbParseError, CbParseErrorKind},
    object::whitespace,
    trailer::trailer,
    CbParseResult, Span,
};
use crate::pdf::{
    xref::{FreeObject, UsedObject},
    Trailer, Xref, XrefEntry,
};

const EOF_MARKER: &[u8] = b"%%EOF";
const STARTXREF: &[u8] = b"startxref";
const XREF: &[u8] = b"xref";

/// Offset of the last cross-reference section, read from the
/// `startxref` line near the end of the input.
#[tracable_parser]
pub fn startxref_tail(input: Span) -> CbParseResult<usize> {
    let (remainder, (trailing, _)) = backward_search(STARTXREF.len() + 1024, bytes::complete::tag(STARTXREF))(input)?;
    let (trailing, _) = character::complete::multispace0(trailing)?;
    let (trailing, xref_pos) = character::complete::u64(trailing)?;
    let xref_pos: usize = xref_pos
        .try_into()
        .map_err(|_| nom::Err::Error(CbParseError::new(input, CbParseErrorKind::StartxrefInvalid)))?;

    let (trailing, _) = character::complete::multispace0(trailing)?;
    if !trailing.fragment().starts_with(EOF_MARKER) {
        log::warn!("no %%EOF marker after startxref {}", xref_pos);
    }

    Ok((remainder, xref_pos))
}

fn entry_kind(input: Span) -> CbParseResult<bool> {
    branch::alt((
        combinator::value(false, character::complete::char('n')),
        combinator::value(true, character::complete::char('f')),
    ))(input)
}

#[tracable_parser]
fn xref_subsection(input: Span) -> CbParseResult<Vec<XrefEntry>> {
    let (remainder, first) = character::complete::u32(input)?;
    let (remainder, _) = character::complete::space1(remainder)?;
    let (remainder, count) = character::complete::u32(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    let invalid = || nom::Err::Failure(CbParseError::new(input, CbParseErrorKind::XrefInvalid));

    // the count comes from the file, don't trust it for allocations
    let mut entries = Vec::with_capacity(count.min(1024) as usize);
    let mut remainder = remainder;
    for i in 0..count {
        let number = first.checked_add(i).ok_or_else(invalid)? as usize;
        let (r, offset) = character::complete::u64(remainder)?;
        let (r, _) = character::complete::space1(r)?;
        let (r, generation) = character::complete::u16(r)?;
        let (r, _) = character::complete::space1(r)?;
        let (r, free) = entry_kind(r)?;
        let (r, _) = character::complete::multispace0(r)?;
        let offset = usize::try_from(offset).map_err(|_| invalid())?;

        entries.push(if free {
            XrefEntry::from(FreeObject {
                number,
                generation,
                next_free: offset,
            })
        } else {
            XrefEntry::from(UsedObject {
                number,
                byte_offset: offset,
                generation,
            })
        });
        remainder = r;
    }

    Ok((remainder, entries))
}

/// Classic `xref` table with one or more subsections.
#[tracable_parser]
pub fn xref_table(input: Span) -> CbParseResult<Xref> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, _) = bytes::complete::tag(XREF)(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, sections) = multi::many1(xref_subsection)(remainder)?;

    Ok((remainder, Xref::from(sections.into_iter().flatten().collect::<Vec<_>>())))
}

/// Cross-reference table followed by its trailer, as found at a
/// `startxref` or `/Prev` offset.
#[tracable_parser]
pub fn xref_section(input: Span) -> CbParseResult<(Xref, Trailer)> {
    let (remainder, xref) = match xref_table(input) {
        Ok(res) => res,
        Err(nom::Err::Error(err)) => {
            // `N G obj` here means a cross-reference stream
            let stream_header: CbParseResult<Span> = combinator::recognize(sequence::tuple((
                character::complete::multispace0,
                character::complete::u32,
                character::complete::multispace1,
                character::complete::u16,
                character::complete::multispace1,
                bytes::complete::tag(&b"obj"[..]),
            )))(input);
            let kind = if stream_header.is_ok() {
                CbParseErrorKind::XrefStreamUnsupported
            } else {
                CbParseErrorKind::XrefInvalid
            };
            return Err(nom::Err::Failure(CbParseError::new(input, kind).caused_by(err)));
        }
        Err(err) => return Err(err),
    };
    let (remainder, _) = whitespace(remainder)?;
    let (remainder, trailer) = trailer(remainder)?;

    Ok((remainder, (xref, trailer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::span;

    #[test]
    fn test_startxref_tail() {
        let input = &b"         startxref\n2132"[..];
        let res = startxref_tail(span(input));
        assert!(matches!(res, Ok((_, 2132))));

        let input = &b"         startxref\n555\n%%EOF\nasdfsadfasdfsadfasdfsadfsadf"[..];
        let res = startxref_tail(span(input));
        assert!(matches!(res, Ok((_, 555))));
    }

    #[test]
    fn test_invalid_startxref_tail() {
        // to big
        let input = &b"         startxref\n9999999999999999999999999999999"[..];
        let res = startxref_tail(span(input));
        assert!(matches!(res, Err(nom::Err::Error(_))));

        let res = startxref_tail(span(b"%PDF-1.4\n%%EOF\n"));
        assert!(res.is_err());
    }

    #[test]
    fn test_xref_table() {
        let input = b"xref\n0 3\n0000000000 65535 f\r\n0000000015 00000 n\r\n0000000074 00000 n\r\n7 1\n0000000300 00001 n \ntrailer";
        let (remainder, xref) = xref_table(span(input)).unwrap();
        assert_eq!(*remainder.fragment(), &b"trailer"[..]);
        assert_eq!(xref.len(), 4);
        assert_eq!(xref.free_objects().count(), 1);
        let used: Vec<(usize, usize, u16)> = xref
            .used_objects()
            .map(|u| (u.number, u.byte_offset, u.generation))
            .collect();
        assert_eq!(used, vec![(1, 15, 0), (2, 74, 0), (7, 300, 1)]);
    }

    #[test]
    fn test_xref_section() {
        let input = b"xref\n0 2\n0000000000 65535 f\n0000000009 00000 n\ntrailer\n<</Size 2/Root 1 0 R>>\nstartxref\n";
        let (_, (xref, trailer)) = xref_section(span(input)).unwrap();
        assert_eq!(xref.len(), 2);
        assert_eq!(trailer.size, 2);
    }

    #[test]
    fn test_xref_stream_is_rejected() {
        let input = b"12 0 obj\n<</Type/XRef/W[1 2 1]/Size 12/Length 3>>stream\n...";
        let res = xref_section(span(input));
        assert!(matches!(
            res,
            Err(nom::Err::Failure(CbParseError {
                kind: CbParseErrorKind::XrefStreamUnsupported,
                ..
            }))
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let res = xref_section(span(b"garbage"));
        assert!(matches!(
            res,
            Err(nom::Err::Failure(CbParseError {
                kind: CbParseErrorKind::XrefInvalid,
                ..
            }))
        ));
    }
}
