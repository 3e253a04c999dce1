//! The default auxiliary tag codec: a self-delimiting per-read tag list
//! stream, deflated.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::codec_failure;
use crate::read::AuxTag;

#[derive(Debug, Default)]
pub(crate) struct AuxEncoder {
    raw: Vec<u8>,
    compressed: Vec<u8>,
}

impl AuxEncoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl super::AuxFieldEncoder for AuxEncoder {
    fn accept(&mut self, aux: &[AuxTag]) -> io::Result<()> {
        let count = u16::try_from(aux.len())
            .map_err(|e| codec_failure("aux", e))?;
        self.raw.extend_from_slice(&count.to_be_bytes());

        for tag in aux {
            self.raw.extend_from_slice(&tag.key());
            self.raw.push(tag.ty());

            let len = u32::try_from(tag.value().len())
                .map_err(|e| codec_failure("aux", e))?;
            self.raw.extend_from_slice(&len.to_be_bytes());
            self.raw.extend_from_slice(tag.value());
        }

        Ok(())
    }

    fn finish(&mut self) -> io::Result<usize> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.raw)?;
        self.compressed = encoder.finish().map_err(|e| codec_failure("aux", e))?;
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
pub(crate) struct AuxDecoder {
    buffer: Vec<u8>,
    cursor: usize,
}

impl AuxDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn read_u16(&mut self) -> io::Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let end = self.cursor + n;
        if end > self.buffer.len() {
            return Err(codec_failure("aux", "truncated tag stream"));
        }
        let out = self.buffer[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(out)
    }
}

impl super::AuxFieldDecoder for AuxDecoder {
    fn start(&mut self, reader: &mut dyn Read) -> io::Result<()> {
        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed)?;

        let mut decoder = GzDecoder::new(&compressed[..]);
        self.buffer.clear();
        decoder
            .read_to_end(&mut self.buffer)
            .map_err(|e| codec_failure("aux", e))?;
        self.cursor = 0;
        Ok(())
    }

    fn decode(&mut self) -> io::Result<Vec<AuxTag>> {
        let count = self.read_u16()?;
        let mut tags = Vec::with_capacity(usize::from(count));

        for _ in 0..count {
            let key_bytes = self.take(2)?;
            let key = [key_bytes[0], key_bytes[1]];
            let ty_bytes = self.take(1)?;
            let ty = ty_bytes[0];
            let len = self.read_u32()? as usize;
            let value = self.take(len)?;
            tags.push(AuxTag::new(key, ty, value));
        }

        Ok(tags)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }
}
