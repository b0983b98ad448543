//! Byte sources and the output record format.

use std::io::{self, Read, Write};

/// A sequential producer of bytes.
///
/// `Ok(None)` means the source is exhausted; `Err` means it failed. The two
/// are kept apart because exhaustion ends a run normally while a failure
/// aborts it.
pub trait ByteSource {
    fn next_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<R: Read> ByteSource for R {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Drops `\n` bytes from a reader.
///
/// A terminal delivers a line feed after every typed byte; wrapping stdin in
/// this keeps `,` from storing those.
#[derive(Debug)]
pub struct SkipNewlines<R> {
    inner: R,
}

impl<R> SkipNewlines<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> Read for SkipNewlines<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                if buf[i] != b'\n' {
                    buf[kept] = buf[i];
                    kept += 1;
                }
            }
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}

/// Write the record emitted by the output op-code.
pub fn write_cell_record<W: Write + ?Sized>(out: &mut W, pointer: usize, value: u8) -> io::Result<()> {
    writeln!(
        out,
        "pointer: {pointer}, string_value: {value}, byte_value: {}",
        value as char
    )
}
