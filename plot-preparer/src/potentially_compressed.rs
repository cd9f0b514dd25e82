use std::io::{BufRead, Read};
use flate2::bufread::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Input stream that is either plain text or gzip-compressed text. Which one
/// is decided once, up front, by peeking at the first bytes.
pub enum PotentiallyCompressedStream<R: BufRead> {
    Uncompressed(R),
    GzipCompressed(MultiGzDecoder<R>),
}

impl<R: BufRead> PotentiallyCompressedStream<R> {
    /// Peeks at the start of `stream` (without consuming anything) to choose
    /// between plain and gzip decoding.
    pub fn detect(mut stream: R) -> std::io::Result<Self> {
        let is_gzip = {
            let head = stream.fill_buf()?;
            head.len() >= GZIP_MAGIC.len() && head[..GZIP_MAGIC.len()] == GZIP_MAGIC
        };
        if is_gzip {
            Ok(PotentiallyCompressedStream::GzipCompressed(MultiGzDecoder::new(stream)))
        } else {
            Ok(PotentiallyCompressedStream::Uncompressed(stream))
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, PotentiallyCompressedStream::GzipCompressed(_))
    }
}

impl<R: BufRead> Read for PotentiallyCompressedStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            PotentiallyCompressedStream::Uncompressed(reader) => reader.read(buf),
            PotentiallyCompressedStream::GzipCompressed(decoder) => decoder.read(buf),
        }
    }
}
