use crate::{
    pdf::{document::K_LENGTH, Name, Object, Stream},
    writer::Encoder,
};

use crate::simple_encode::SimpleEncoder;

const START_STREAM: &[u8] = b"stream\n";
const END_STREAM: &[u8] = b"\nendstream";

impl Encoder<Stream> for SimpleEncoder {
    fn write_to(s: &Stream, writer: &mut dyn crate::writer::Writer) {
        // the length always reflects the payload, whatever the caller put there
        let mut updated_dict = s.dictionary.clone();
        updated_dict.insert(Name::from(K_LENGTH), Object::from(s.data.len()));
        Self::write_to(&updated_dict, writer);
        writer.write(b"\n");
        writer.write(START_STREAM);
        writer.write(&s.data);
        writer.write(END_STREAM);
    }
}

#[cfg(test)]
mod tests {
    use crate::pdf::{dictionary, Object};

    use super::*;

    #[test]
    fn length_is_set() {
        let s = Stream::new(Default::default(), b"q 1 0 0 1 0 0 cm Q".to_vec());
        let mut out = Vec::new();
        SimpleEncoder::write_to(&s, &mut out);
        assert_eq!(
            &out[..],
            &b"<</Length 18>>\nstream\nq 1 0 0 1 0 0 cm Q\nendstream"[..]
        );
    }

    #[test]
    fn wrong_length_is_replaced() {
        let s = Stream::new(dictionary([(K_LENGTH, Object::Integer(999))]), vec![1, 2, 3]);
        let mut out = Vec::new();
        SimpleEncoder::write_to(&s, &mut out);
        assert!(out.starts_with(b"<</Length 3>>\n"));
        assert_eq!(SimpleEncoder::encoded_len(&s), out.len());
    }
}
