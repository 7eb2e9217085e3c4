use nom::bytes;
use nom_tracable::tracable_parser;

use super::{
    error::CbParseError,
    object::{dictionary, whitespace},
    CbParseResult, Span,
};
use crate::pdf::{trailer::TRAILER, Trailer};

/// `trailer << ... >>`
#[tracable_parser]
pub fn trailer(input: Span) -> CbParseResult<Trailer> {
    let (remainder, _) = bytes::complete::tag(TRAILER)(input)?;
    let (remainder, _) = whitespace(remainder)?;
    let (remainder, dict) = dictionary(remainder)?;

    let trailer =
        Trailer::try_from(dict).map_err(|err| nom::Err::Failure(CbParseError::new(input, err.into())))?;

    Ok((remainder, trailer))
}
