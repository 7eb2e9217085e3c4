use crate::{
    parse::object::{FALSE_OBJECT, NULL_OBJECT, TRUE_OBJECT},
    pdf::{Object, Reference},
    simple_encode::format_real,
    writer::{Encoder, Writer},
};

use super::SimpleEncoder;

pub(crate) mod array;
pub(crate) mod dictionary;
pub(crate) mod indirect;
pub(crate) mod stream;
pub(crate) mod string;

impl Encoder<Object> for SimpleEncoder {
    fn write_to(obj: &Object, writer: &mut dyn Writer) {
        match obj {
            Object::String(str) => Self::write_to(str, writer),
            Object::HexString(bytes) => {
                writer.write(b"<");
                writer.write(hex::encode_upper(&bytes[..]).as_bytes());
                writer.write(b">");
            }
            Object::Float(f) => writer.write(format_real(*f).as_bytes()),
            Object::Integer(i) => writer.write(i.to_string().as_bytes()),
            Object::Bool(true) => writer.write(TRUE_OBJECT.as_bytes()),
            Object::Bool(false) => writer.write(FALSE_OBJECT.as_bytes()),
            Object::Name(n) => Self::write_to(n, writer),
            Object::Array(a) => Self::write_to(a, writer),
            Object::Dictionary(d) => Self::write_to(d, writer),
            Object::Stream(s) => Self::write_to(s, writer),
            Object::Null => writer.write(NULL_OBJECT.as_bytes()),
            Object::Reference(r) => Self::write_to(r, writer),
        }
    }
}

impl Encoder<Reference> for SimpleEncoder {
    fn write_to(r: &Reference, writer: &mut dyn Writer) {
        writer.write(r.index.to_string().as_bytes());
        writer.write(b" ");
        writer.write(r.generation.to_string().as_bytes());
        writer.write(b" R");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Bytes, CbString, Name};

    fn encode(obj: &Object) -> String {
        let mut out = Vec::new();
        SimpleEncoder::write_to(obj, &mut out);
        assert_eq!(SimpleEncoder::encoded_len(obj), out.len());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(encode(&Object::Integer(-42)), "-42");
        assert_eq!(encode(&Object::Float(0.75)), "0.75");
        assert_eq!(encode(&Object::Bool(true)), "true");
        assert_eq!(encode(&Object::Null), "null");
        assert_eq!(encode(&Object::from(Name::from("DeviceRGB"))), "/DeviceRGB");
    }

    #[test]
    fn strings() {
        assert_eq!(encode(&Object::from(CbString::from(b"Vol. 1".to_vec()))), "(Vol. 1)");
        assert_eq!(encode(&Object::HexString(Bytes::from(vec![0x00, 0xab, 0xff]))), "<00ABFF>");
    }

    #[test]
    fn reference() {
        assert_eq!(encode(&Object::from(Reference::new(12))), "12 0 R");
    }
}
