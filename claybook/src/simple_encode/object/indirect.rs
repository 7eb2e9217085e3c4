use crate::{pdf::IndirectObject, writer::Encoder};

use crate::simple_encode::SimpleEncoder;

const START_OBJECT: &[u8] = b" obj\n";
const END_OBJECT: &[u8] = b"\nendobj\n";

impl Encoder<IndirectObject> for SimpleEncoder {
    fn write_to(o: &IndirectObject, writer: &mut dyn crate::writer::Writer) {
        writer.write(o.index.to_string().as_bytes());
        writer.write(b" ");
        writer.write(o.generation.to_string().as_bytes());
        writer.write(START_OBJECT);
        Self::write_to(&*o.object, writer);
        writer.write(END_OBJECT);
    }
}
