use super::error::{Error, Result};
use std::io::{ErrorKind, Write};
use tracing::error;

/// Writes blocks of raw words in native byte order, for piping into statistical test suites.
/// A block the sink does not accept in full is an error that reports how far it got.
pub struct WordSink<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    /// Bytes accepted so far.
    total: u64,
}

impl<W: Write> WordSink<W> {

    pub fn new(inner: W) -> Self {
        WordSink { inner, buffer: Vec::new(), total: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn write_u32s(&mut self, words: &[u32]) -> Result<()> {
        self.buffer.clear();
        for w in words {
            self.buffer.extend_from_slice(&w.to_ne_bytes());
        }
        self.write_buffer()
    }

    pub fn write_u64s(&mut self, words: &[u64]) -> Result<()> {
        self.buffer.clear();
        for w in words {
            self.buffer.extend_from_slice(&w.to_ne_bytes());
        }
        self.write_buffer()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_buffer(&mut self) -> Result<()> {
        let expected = self.buffer.len();
        let mut written = 0;
        while written < expected {
            match self.inner.write(&self.buffer[written ..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.total += written as u64;
                    error!(written, expected, total = self.total, "write failed: {}", e);
                    return Err(Error::Io(e));
                }
            }
        }
        self.total += written as u64;
        if written < expected {
            error!(written, expected, total = self.total, "short write");
            return Err(Error::ShortWrite { written, expected, total: self.total });
        }
        Ok(())
    }
}
