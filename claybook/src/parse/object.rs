use nom::{
    branch, bytes, character, combinator,
    error::{ErrorKind, ParseError},
    multi, sequence, Slice,
};
use nom_tracable::tracable_parser;

use super::{
    error::{CbParseError, CbParseErrorKind},
    CbParseResult, Span,
};
use crate::pdf::{
    document::K_LENGTH, Array, Bytes, CbString, Dictionary, IndirectObject, Name, Object, Reference, Stream,
};

pub(crate) const TRUE_OBJECT: &str = "true";
pub(crate) const FALSE_OBJECT: &str = "false";
pub(crate) const NULL_OBJECT: &str = "null";

const OBJ: &[u8] = b"obj";
const END_OBJ: &[u8] = b"endobj";
const STREAM: &[u8] = b"stream";
const END_STREAM: &[u8] = b"endstream";
const DICT_START: &[u8] = b"<<";
const DICT_END: &[u8] = b">>";

fn is_delimiter(chr: u8) -> bool {
    matches!(
        chr,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_whitespace(chr: u8) -> bool {
    matches!(chr, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\0')
}

pub(crate) fn is_regular(chr: u8) -> bool {
    !is_delimiter(chr) && !is_whitespace(chr)
}

fn error(input: Span, kind: ErrorKind) -> nom::Err<CbParseError<Span>> {
    nom::Err::Error(CbParseError::from_error_kind(input, kind))
}

fn comment(input: Span) -> CbParseResult<()> {
    combinator::value(
        (),
        sequence::pair(
            character::complete::char('%'),
            bytes::complete::take_while(|c| c != b'\n' && c != b'\r'),
        ),
    )(input)
}

/// Skip white-space and comments.
pub(crate) fn whitespace(input: Span) -> CbParseResult<()> {
    combinator::value(
        (),
        multi::many0_count(branch::alt((
            combinator::value((), bytes::complete::take_while1(is_whitespace)),
            comment,
        ))),
    )(input)
}

/// Regular tokens (numbers, names, keywords) must be followed by
/// white-space, a delimiter or the end of input. Consumes trailing
/// white-space.
fn require_termination(input: Span) -> CbParseResult<()> {
    let (remainder, _) = whitespace(input)?;
    let skipped = remainder.location_offset() != input.location_offset();
    match remainder.fragment().first() {
        Some(&c) if !skipped && !is_delimiter(c) => Err(error(remainder, ErrorKind::Verify)),
        _ => Ok((remainder, ())),
    }
}

fn keyword<'a>(word: &'static str) -> impl FnMut(Span<'a>) -> CbParseResult<'a, ()> {
    move |input| {
        let (remainder, _) = bytes::complete::tag(word.as_bytes())(input)?;
        require_termination(remainder)
    }
}

#[tracable_parser]
fn literal_string(input: Span) -> CbParseResult<Object> {
    let (content, _) = character::complete::char('(')(input)?;
    let bytes = *content.fragment();

    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    loop {
        let c = match bytes.get(i) {
            Some(&c) => c,
            None => return Err(error(input, ErrorKind::Eof)),
        };
        i += 1;
        match c {
            b'(' => {
                depth += 1;
                out.push(c);
            }
            b')' if depth == 0 => break,
            b')' => {
                depth -= 1;
                out.push(c);
            }
            b'\r' => {
                // all end-of-line markers read as a single newline
                out.push(b'\n');
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\\' => {
                let escaped = match bytes.get(i) {
                    Some(&e) => e,
                    None => return Err(error(input, ErrorKind::Eof)),
                };
                i += 1;
                match escaped {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        let mut digits = 1;
                        while digits < 3 {
                            match bytes.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                    digits += 1;
                                }
                                _ => break,
                            }
                        }
                        // high-order overflow is ignored
                        out.push((value & 0xff) as u8);
                    }
                    b'\r' => {
                        if bytes.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                    }
                    b'\n' => {}
                    // covers `\(`, `\)`, `\\` and unknown escapes, whose
                    // backslash is dropped
                    other => out.push(other),
                }
            }
            _ => out.push(c),
        }
    }

    let remainder = content.slice(i..);
    let (remainder, _) = whitespace(remainder)?;
    Ok((remainder, Object::String(CbString::from(out))))
}

#[tracable_parser]
fn hex_string(input: Span) -> CbParseResult<Object> {
    let (remainder, digits) = sequence::delimited(
        character::complete::char('<'),
        bytes::complete::take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
        character::complete::char('>'),
    )(input)?;

    let mut digits: Vec<u8> = digits.fragment().iter().copied().filter(|c| !is_whitespace(*c)).collect();
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    let bytes = hex::decode(&digits).map_err(|_| error(input, ErrorKind::HexDigit))?;

    let (remainder, _) = whitespace(remainder)?;
    Ok((remainder, Object::HexString(Bytes::from(bytes))))
}

#[tracable_parser]
fn number_object(input: Span) -> CbParseResult<Object> {
    let (remainder, number) = combinator::recognize(sequence::pair(
        combinator::opt(character::complete::one_of("+-")),
        branch::alt((
            combinator::recognize(sequence::pair(
                character::complete::digit1,
                combinator::opt(sequence::pair(character::complete::char('.'), character::complete::digit0)),
            )),
            combinator::recognize(sequence::pair(character::complete::char('.'), character::complete::digit1)),
        )),
    ))(input)?;
    let (remainder, _) = require_termination(remainder)?;

    let text = std::str::from_utf8(number.fragment()).map_err(|_| error(input, ErrorKind::Digit))?;
    let obj = if text.contains('.') {
        Object::Float(text.parse().map_err(|_| error(input, ErrorKind::Float))?)
    } else {
        match text.parse::<i64>() {
            Ok(i) => Object::Integer(i),
            // out of range integers degrade to reals
            Err(_) => Object::Float(text.parse().map_err(|_| error(input, ErrorKind::Digit))?),
        }
    };
    Ok((remainder, obj))
}

#[tracable_parser]
fn bool_object(input: Span) -> CbParseResult<Object> {
    branch::alt((
        combinator::value(Object::Bool(true), keyword(TRUE_OBJECT)),
        combinator::value(Object::Bool(false), keyword(FALSE_OBJECT)),
    ))(input)
}

#[tracable_parser]
fn null_object(input: Span) -> CbParseResult<Object> {
    combinator::value(Object::Null, keyword(NULL_OBJECT))(input)
}

/// `/Name`, with `#XX` escapes resolved.
#[tracable_parser]
pub(crate) fn name(input: Span) -> CbParseResult<Name> {
    let (remainder, _) = character::complete::char('/')(input)?;
    let (remainder, raw) = bytes::complete::take_while(is_regular)(remainder)?;
    let (remainder, _) = require_termination(remainder)?;

    let raw = *raw.fragment();
    let mut decoded = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let Ok(byte) = hex::decode(&raw[i + 1..i + 3]) {
                decoded.extend_from_slice(&byte);
                i += 3;
                continue;
            }
        }
        decoded.push(raw[i]);
        i += 1;
    }

    Ok((remainder, Name::from(decoded)))
}

fn name_object(input: Span) -> CbParseResult<Object> {
    combinator::map(name, Object::from)(input)
}

#[tracable_parser]
pub(crate) fn dictionary(input: Span) -> CbParseResult<Dictionary> {
    let (remainder, _) = bytes::complete::tag(DICT_START)(input)?;
    let (remainder, _) = whitespace(remainder)?;
    let (remainder, dict) = multi::fold_many0(
        sequence::pair(name, object),
        Dictionary::default,
        |mut acc, (name, obj)| {
            acc.insert(name, obj);
            acc
        },
    )(remainder)?;
    let (remainder, _) = bytes::complete::tag(DICT_END)(remainder)?;
    let (remainder, _) = whitespace(remainder)?;

    Ok((remainder, dict))
}

fn dictionary_object(input: Span) -> CbParseResult<Object> {
    combinator::map(dictionary, Object::from)(input)
}

#[tracable_parser]
fn array_object(input: Span) -> CbParseResult<Object> {
    let (remainder, _) = character::complete::char('[')(input)?;
    let (remainder, _) = whitespace(remainder)?;
    let (remainder, array) = multi::fold_many0(object, Vec::new, |mut acc, obj| {
        acc.push(obj);
        acc
    })(remainder)?;
    let (remainder, _) = character::complete::char(']')(remainder)?;
    let (remainder, _) = whitespace(remainder)?;

    Ok((remainder, Object::Array(Array::from(array))))
}

/// `N G` as it prefixes references and indirect objects.
fn object_id(input: Span) -> CbParseResult<(u32, u16)> {
    let (remainder, index) = character::complete::u32(input)?;
    let (remainder, _) = character::complete::multispace1(remainder)?;
    let (remainder, generation) = character::complete::u16(remainder)?;
    let (remainder, _) = whitespace(remainder)?;
    Ok((remainder, (index, generation)))
}

#[tracable_parser]
fn reference_object(input: Span) -> CbParseResult<Object> {
    let (remainder, (index, generation)) = object_id(input)?;
    let (remainder, _) = character::complete::char('R')(remainder)?;
    let (remainder, _) = require_termination(remainder)?;

    Ok((remainder, Object::Reference(Reference { index, generation })))
}

/// Any direct object, including trailing white-space.
#[tracable_parser]
pub fn object(input: Span) -> CbParseResult<Object> {
    // The order is important!
    branch::alt((
        dictionary_object,
        hex_string,
        array_object,
        literal_string,
        // `0 0 R` is a reference while `0 0` are two integers.
        reference_object,
        number_object,
        bool_object,
        null_object,
        name_object,
    ))(input)
}

/// Stream payload after a dictionary. Only direct `/Length` values are
/// understood.
fn stream_data<'a>(dictionary: &Dictionary, input: Span<'a>) -> CbParseResult<'a, Bytes> {
    let (remainder, _) = bytes::complete::tag(STREAM)(input)?;
    let (remainder, _) = branch::alt((
        bytes::complete::tag(&b"\r\n"[..]),
        bytes::complete::tag(&b"\n"[..]),
        bytes::complete::tag(&b"\r"[..]),
    ))(remainder)?;
    let length = dictionary
        .get(K_LENGTH)
        .and_then(Object::integer)
        .and_then(|l| usize::try_from(l).ok())
        .ok_or_else(|| nom::Err::Failure(CbParseError::new(input, CbParseErrorKind::StreamLengthUnknown)))?;
    let (remainder, data) = bytes::complete::take(length)(remainder)?;
    let (remainder, _) = whitespace(remainder)?;
    let (remainder, _) = bytes::complete::tag(END_STREAM)(remainder)?;
    let (remainder, _) = whitespace(remainder)?;
    Ok((remainder, Bytes::from(*data.fragment())))
}

/// `N G obj ... endobj`
#[tracable_parser]
pub fn indirect_object(input: Span) -> CbParseResult<IndirectObject> {
    let (remainder, _) = whitespace(input)?;
    let (remainder, (index, generation)) = object_id(remainder)?;
    let (remainder, _) = bytes::complete::tag(OBJ)(remainder)?;
    let (remainder, _) = whitespace(remainder)?;
    let (remainder, object) = object(remainder)?;

    let (remainder, object) = match object {
        Object::Dictionary(dictionary) if remainder.fragment().starts_with(STREAM) => {
            let (remainder, data) = stream_data(&dictionary, remainder)?;
            (remainder, Object::Stream(Stream::new(dictionary, data)))
        }
        object => (remainder, object),
    };

    let (remainder, _) = bytes::complete::tag(END_OBJ)(remainder)?;
    let (remainder, _) = require_termination(remainder)?;

    Ok((
        remainder,
        IndirectObject {
            index,
            generation,
            object: Box::new(object),
        },
    ))
}
