use crate::{
    pdf::Array,
    simple_encode::SimpleEncoder,
    writer::{Encoder, Writer},
};

impl Encoder<Array> for SimpleEncoder {
    fn encoded_len(array: &Array) -> usize {
        let items: usize = array.iter().map(Self::encoded_len).sum();
        // brackets plus one space between neighbours
        items + 2 + array.len().saturating_sub(1)
    }

    fn write_to(array: &Array, writer: &mut dyn Writer) {
        writer.write(b"[");
        let mut items = array.iter();
        if let Some(first) = items.next() {
            Self::write_to(first, writer);
            for item in items {
                writer.write(b" ");
                Self::write_to(item, writer);
            }
        }
        writer.write(b"]");
    }
}
