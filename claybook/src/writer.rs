use std::io;

/// Byte sink the encoders write into.
///
/// Writing is infallible from the encoder's point of view; sinks backed by
/// I/O keep the first error and report it through [`IoSink::take_error`].
pub trait Writer {
    fn write(&mut self, buf: &[u8]);

    /// Number of bytes written since the start of the file.
    fn position(&self) -> usize;
}

impl Writer for Vec<u8> {
    fn write(&mut self, buf: &[u8]) {
        self.extend_from_slice(buf);
    }

    fn position(&self) -> usize {
        self.len()
    }
}

/// Serialize values of type `T` into a [`Writer`].
pub trait Encoder<T: ?Sized> {
    /// Exact number of bytes `write_to` produces.
    fn encoded_len(o: &T) -> usize {
        let mut out = Vec::new();
        Self::write_to(o, &mut out);
        out.len()
    }

    fn write_to(o: &T, writer: &mut dyn Writer);
}

/// [`Writer`] over an [`io::Write`] that tracks the absolute file position.
pub struct IoSink<W: io::Write> {
    inner: W,
    position: usize,
    error: Option<io::Error>,
}

impl<W: io::Write> IoSink<W> {
    /// `position` is the file offset the first written byte lands at, the
    /// current file length when appending.
    pub fn new(inner: W, position: usize) -> Self {
        Self {
            inner,
            position,
            error: None,
        }
    }

    /// First error hit since the last call, if any. Writes after an error are
    /// dropped.
    pub fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.take_error()?;
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Writer for IoSink<W> {
    fn write(&mut self, buf: &[u8]) {
        if self.error.is_some() {
            return;
        }
        match self.inner.write_all(buf) {
            Ok(()) => self.position += buf.len(),
            Err(err) => self.error = Some(err),
        }
    }

    fn position(&self) -> usize {
        self.position
    }
}
