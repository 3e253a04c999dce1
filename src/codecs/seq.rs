//! The default sequence codec: each base packed into a 4-bit code
//! (covering upper- and lower-case `ACGTN`), then deflated.
//!
//! This stands in for an assembly- or reference-based sequence coder
//! (§1, §4.3); the container's own reference binding and verification
//! (`crate::reference`) is a separate, non-opaque concern and does not
//! depend on how this codec compresses bases.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use super::bits::{BitReader, BitWriter};
use crate::error::codec_failure;

const CODES: [u8; 10] = *b"ACGTNacgtn";

fn base_to_code(base: u8) -> io::Result<u32> {
    CODES
        .iter()
        .position(|&b| b == base)
        .map(|i| i as u32)
        .ok_or_else(|| codec_failure("seq", format!("unsupported base byte {base:#04x}")))
}

fn code_to_base(code: u32) -> io::Result<u8> {
    CODES
        .get(code as usize)
        .copied()
        .ok_or_else(|| codec_failure("seq", format!("invalid base code {code}")))
}

#[derive(Debug, Default)]
pub(crate) struct SeqEncoder {
    raw: Vec<u8>,
    compressed: Vec<u8>,
}

impl SeqEncoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl super::SeqFieldEncoder for SeqEncoder {
    fn accept(&mut self, seq: &[u8]) -> io::Result<()> {
        self.raw.extend_from_slice(seq);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<usize> {
        let mut packed = BitWriter::new();
        for &base in &self.raw {
            packed.write_bits(base_to_code(base)?, 4);
        }
        let packed = packed.finish();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&packed)?;
        self.compressed = encoder.finish().map_err(|e| codec_failure("seq", e))?;
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
pub(crate) struct SeqDecoder {
    packed: Vec<u8>,
    bit_pos: usize,
}

impl SeqDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl super::SeqFieldDecoder for SeqDecoder {
    fn start(&mut self, reader: &mut dyn Read) -> io::Result<()> {
        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed)?;

        let mut decoder = GzDecoder::new(&compressed[..]);
        self.packed.clear();
        decoder
            .read_to_end(&mut self.packed)
            .map_err(|e| codec_failure("seq", e))?;
        self.bit_pos = 0;
        Ok(())
    }

    fn decode(&mut self, read_length: usize) -> io::Result<Vec<u8>> {
        let mut bits = BitReader::new(&self.packed);
        // Advance a fresh reader to our saved bit position; cheap relative
        // to read lengths and avoids holding a borrow across calls.
        for _ in 0..self.bit_pos {
            bits.read_bit();
        }

        let mut out = Vec::with_capacity(read_length);
        for _ in 0..read_length {
            let mut code = 0u32;
            for _ in 0..4 {
                code = (code << 1) | bits.read_bit();
            }
            out.push(code_to_base(code)?);
        }

        self.bit_pos += read_length * 4;
        Ok(out)
    }

    fn reset(&mut self) {
        self.packed.clear();
        self.bit_pos = 0;
    }
}
