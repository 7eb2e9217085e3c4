use crate::{
    pdf::CbString,
    simple_encode::SimpleEncoder,
    writer::{Encoder, Writer},
};

/// Positions of bytes that must be preceded by a backslash.
///
/// Balanced parentheses are allowed literally in a PDF string. Unbalanced
/// ones would end the string early (or never), so they are escaped along
/// with backslashes and carriage returns.
fn escape_positions(str: &[u8]) -> Vec<usize> {
    let mut escaped = Vec::new();
    let mut open_paranthesis = Vec::new();
    for (index, char) in str.iter().enumerate() {
        match char {
            b'(' => open_paranthesis.push(index),
            b')' => {
                if open_paranthesis.pop().is_none() {
                    escaped.push(index);
                }
            }
            b'\\' | b'\r' => escaped.push(index),
            _ => {}
        }
    }
    // whatever stays open has no partner
    escaped.extend(open_paranthesis);
    escaped.sort_unstable();
    escaped
}

impl Encoder<CbString> for SimpleEncoder {
    fn encoded_len(str: &CbString) -> usize {
        // two for the delimiting parentheses
        str.len() + escape_positions(str).len() + 2
    }

    fn write_to(str: &CbString, writer: &mut dyn Writer) {
        writer.write(b"(");
        let mut last_written_index = 0;
        for index in escape_positions(str) {
            writer.write(&str[last_written_index..index]);
            if str[index] == b'\r' {
                writer.write(br"\r");
            } else {
                writer.write(br"\");
                writer.write(&str[index..=index]);
            }
            last_written_index = index + 1;
        }
        writer.write(&str[last_written_index..]);
        writer.write(b")");
    }
}
