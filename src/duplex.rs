use std::io::{self, Read, Write};

/// A bidirectional byte stream assembled from a separate reader and writer.
///
/// Reads go to `R`, writes go to `W`. This lets stdin/stdout, or an input
/// slice and an output buffer, be handed to a machine as one stream.
#[derive(Debug, Default)]
pub struct Duplex<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Duplex<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: Read, W> Read for Duplex<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R, W: Write> Write for Duplex<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_from_reader_only() {
        let mut stream = Duplex::new(&b"xy"[..], Vec::<u8>::new());
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"xy");
        assert!(stream.writer().is_empty());
    }

    #[test]
    fn test_writes_to_writer_only() {
        let mut stream = Duplex::new(io::empty(), Vec::new());
        stream.write_all(b"out").unwrap();
        stream.flush().unwrap();
        let (_, written) = stream.into_parts();
        assert_eq!(written, b"out");
    }

    #[test]
    fn test_borrowed_stream_stays_with_caller() {
        // Machines take streams by value; `&mut Duplex` is itself a stream.
        let mut stream = Duplex::new(&b"a"[..], Vec::new());
        {
            let borrowed = &mut stream;
            let mut byte = [0u8; 1];
            borrowed.read_exact(&mut byte).unwrap();
            borrowed.write_all(&byte).unwrap();
        }
        assert_eq!(stream.writer(), b"a");
        assert!(stream.reader().is_empty());
    }
}
