//! nom parsers for the parts of an existing PDF that appending needs: the
//! `startxref` pointer, classic cross-reference tables, trailers and single
//! indirect objects.
//!
//! All parsers work on [`Span`], which records the absolute byte offset of
//! every slice. With the `trace` feature the parsers report to
//! `nom_tracable`.

use nom::{IResult, InputLength, InputTake};
use nom_locate::LocatedSpan;
use nom_tracable::TracableInfo;

use self::error::{CbParseError, CbParseErrorKind};

pub mod error;
pub(crate) mod object;
mod trailer;
mod xref;

pub use object::{indirect_object, object};
pub use trailer::trailer;
pub use xref::{startxref_tail, xref_section, xref_table};

pub type Span<'a> = LocatedSpan<&'a [u8], TracableInfo>;
pub type CbParseResult<'a, O> = IResult<Span<'a>, O, CbParseError<Span<'a>>>;

/// Wrap a buffer for parsing. Offsets reported by the parsers are relative
/// to the start of `buf`.
pub fn span(buf: &[u8]) -> Span<'_> {
    let info = TracableInfo::new();
    #[cfg(feature = "trace")]
    let info = info.forward(true).backward(true);
    LocatedSpan::new_extra(buf, info)
}

/// Try `parser` at every position of the last `limit` bytes of the input,
/// starting at the end.
///
/// On success returns the input before the match as remainder, together
/// with whatever followed the match and the parser output.
pub fn backward_search<I, O, P>(limit: usize, mut parser: P) -> impl FnMut(I) -> IResult<I, (I, O), CbParseError<I>>
where
    I: InputTake + InputLength + Clone,
    P: nom::Parser<I, O, CbParseError<I>>,
{
    move |input: I| {
        let len = input.input_len();
        for start in (len.saturating_sub(limit)..len).rev() {
            let (tail, head) = input.take_split(start);
            if let Ok((trailing, output)) = parser.parse(tail) {
                return Ok((head, (trailing, output)));
            }
        }
        Err(nom::Err::Error(CbParseError::new(
            input,
            CbParseErrorKind::BackwardSearchNotFound,
        )))
    }
}
