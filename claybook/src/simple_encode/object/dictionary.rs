use crate::{
    pdf::Dictionary,
    simple_encode::SimpleEncoder,
    writer::{Encoder, Writer},
};

impl Encoder<Dictionary> for SimpleEncoder {
    fn encoded_len(dict: &Dictionary) -> usize {
        let entries: usize = dict
            .iter()
            .map(|(key, value)| Self::encoded_len(key) + 1 + Self::encoded_len(value))
            .sum();
        entries + 4 + dict.len().saturating_sub(1)
    }

    /// Entries are written in insertion order.
    fn write_to(dict: &Dictionary, writer: &mut dyn Writer) {
        writer.write(b"<<");
        for (i, (key, value)) in dict.iter().enumerate() {
            if i > 0 {
                writer.write(b" ");
            }
            Self::write_to(key, writer);
            writer.write(b" ");
            Self::write_to(value, writer);
        }
        writer.write(b">>");
    }
}
