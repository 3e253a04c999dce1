//! The default identifier codec: a NUL-delimited byte stream, deflated.
//!
//! The real collaborator this stands in for is a diff/tokenizing coder
//! (read identifiers within a run are usually near-identical save for a
//! trailing counter); deflate's own LZ77 window already captures most of
//! that redundancy across the short distances typical of a chunk's worth
//! of ids, so a dedicated tokenizer is not required for this codec to be
//! a correct, self-contained collaborator.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::codec_failure;

#[derive(Debug, Default)]
pub(crate) struct IdEncoder {
    raw: Vec<u8>,
    compressed: Vec<u8>,
}

impl IdEncoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl super::IdFieldEncoder for IdEncoder {
    fn accept(&mut self, id: &[u8]) -> io::Result<()> {
        self.raw.extend_from_slice(id);
        self.raw.push(0);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<usize> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.raw)?;
        self.compressed = encoder
            .finish()
            .map_err(|e| codec_failure("id", e))?;
        self.raw.clear();
        Ok(self.compressed.len())
    }

    fn flush(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.compressed)?;
        self.compressed.clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct IdDecoder {
    buffer: Vec<u8>,
    cursor: usize,
}

impl IdDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl super::IdFieldDecoder for IdDecoder {
    fn start(&mut self, reader: &mut dyn Read) -> io::Result<()> {
        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed)?;

        let mut decoder = GzDecoder::new(&compressed[..]);
        self.buffer.clear();
        decoder
            .read_to_end(&mut self.buffer)
            .map_err(|e| codec_failure("id", e))?;
        self.cursor = 0;
        Ok(())
    }

    fn decode(&mut self) -> io::Result<Vec<u8>> {
        let start = self.cursor;
        let rest = &self.buffer[start..];
        let nul = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            codec_failure("id", "missing NUL terminator in decoded identifier stream")
        })?;

        self.cursor = start + nul + 1;
        Ok(rest[..nul].to_vec())
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{IdFieldDecoder, IdFieldEncoder};

    #[test]
    fn test_round_trip_several_ids() -> io::Result<()> {
        let mut enc = IdEncoder::new();
        for id in [&b"read.1"[..], b"read.2", b"read.3"] {
            enc.accept(id)?;
        }
        enc.finish()?;

        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = IdDecoder::new();
        dec.start(&mut &payload[..])?;
        assert_eq!(dec.decode()?, b"read.1");
        assert_eq!(dec.decode()?, b"read.2");
        assert_eq!(dec.decode()?, b"read.3");
        Ok(())
    }

    #[test]
    fn test_round_trip_empty_id() -> io::Result<()> {
        let mut enc = IdEncoder::new();
        enc.accept(b"")?;
        enc.accept(b"r2")?;
        enc.finish()?;

        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = IdDecoder::new();
        dec.start(&mut &payload[..])?;
        assert_eq!(dec.decode()?, b"");
        assert_eq!(dec.decode()?, b"r2");
        Ok(())
    }

    #[test]
    fn test_reset_clears_decoder_state() -> io::Result<()> {
        let mut enc = IdEncoder::new();
        enc.accept(b"a")?;
        enc.finish()?;
        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = IdDecoder::new();
        dec.start(&mut &payload[..])?;
        dec.decode()?;
        dec.reset();
        assert!(dec.buffer.is_empty());
    }
}
