use crate::{
    pdf::{trailer::TRAILER, xref::XrefEntry, Dictionary, Trailer, Xref},
    simple_encode::SimpleEncoder,
    writer::{Encoder, Writer},
};

/// Every table line is exactly 20 bytes, including the two byte EOL.
fn write_entry(entry: &XrefEntry, writer: &mut dyn Writer) {
    let line = match entry {
        XrefEntry::Free(free) => format!("{:010} {:05} f\r\n", free.next_free, free.generation),
        XrefEntry::Used(used) => format!("{:010} {:05} n\r\n", used.byte_offset, used.generation),
    };
    writer.write(line.as_bytes());
}

impl Encoder<Xref> for SimpleEncoder {
    fn write_to(o: &Xref, writer: &mut dyn Writer) {
        log::trace!("write XRef with {} entries", o.len());

        writer.write(b"xref\n");
        for section in o.subsections() {
            if let Some(first) = section.first() {
                writer.write(format!("{} {}\n", first.number(), section.len()).as_bytes());
            }
            for entry in section {
                write_entry(entry, writer);
            }
        }
    }
}

impl Encoder<Trailer> for SimpleEncoder {
    fn write_to(trailer: &Trailer, writer: &mut dyn Writer) {
        log::trace!("write Trailer");

        let trailer_dict: Dictionary = trailer.clone().into();
        writer.write(TRAILER);
        writer.write(b"\n");
        Self::write_to(&trailer_dict, writer);
        writer.write(b"\n");
    }
}

#[cfg(test)]
mod tests {
    use crate::pdf::{
        xref::{FreeObject, UsedObject},
        Reference,
    };

    use super::*;

    #[test]
    fn table_with_gap() {
        let xref = Xref::from(vec![
            XrefEntry::from(UsedObject {
                number: 12,
                byte_offset: 3000,
                generation: 0,
            }),
            XrefEntry::from(UsedObject {
                number: 3,
                byte_offset: 120,
                generation: 0,
            }),
            XrefEntry::from(UsedObject {
                number: 11,
                byte_offset: 2500,
                generation: 0,
            }),
        ]);
        let mut out = Vec::new();
        SimpleEncoder::write_to(&xref, &mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "xref\n3 1\n0000000120 00000 n\r\n11 2\n0000002500 00000 n\r\n0000003000 00000 n\r\n"
        );
    }

    #[test]
    fn free_head() {
        let xref = Xref::from(vec![XrefEntry::from(FreeObject {
            number: 0,
            generation: u16::MAX,
            next_free: 0,
        })]);
        let mut out = Vec::new();
        SimpleEncoder::write_to(&xref, &mut out);
        assert_eq!(&out[..], b"xref\n0 1\n0000000000 65535 f\r\n");
    }

    #[test]
    fn trailer_with_prev() {
        let mut trailer = Trailer::new(Reference::new(1));
        trailer.size = 9;
        trailer.previous = Some(1024);
        trailer.info = Some(Reference::new(8));
        let mut out = Vec::new();
        SimpleEncoder::write_to(&trailer, &mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "trailer\n<</Size 9 /Prev 1024 /Root 1 0 R /Info 8 0 R>>\n"
        );
    }
}
