use crate::{parse::object::is_regular, pdf::Name, writer::Encoder};

use super::SimpleEncoder;

/// Bytes that cannot appear literally inside a name.
fn needs_escape(c: u8) -> bool {
    c == b'#' || !is_regular(c) || !(0x21..=0x7e).contains(&c)
}

impl Encoder<Name> for SimpleEncoder {
    fn encoded_len(n: &Name) -> usize {
        n.iter().map(|&c| if needs_escape(c) { 3 } else { 1 }).sum::<usize>() + 1
    }

    fn write_to(n: &Name, writer: &mut dyn crate::writer::Writer) {
        writer.write(b"/");
        let mut rest: &[u8] = n;
        while let Some(at) = rest.iter().position(|&c| needs_escape(c)) {
            writer.write(&rest[..at]);
            writer.write(format!("#{:02X}", rest[at]).as_bytes());
            rest = &rest[at + 1..];
        }
        writer.write(rest);
    }
}
