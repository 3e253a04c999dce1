//! CRC64 checksum primitives.
//!
//! `noodles-cram` computes its block checksums with `flate2::CrcWriter`, a
//! transparent `Write` wrapper that accumulates a running checksum as bytes
//! pass through it (see `io::writer::container::block::write_block`). This
//! format's per-field checksums run over raw field bytes that are never
//! themselves written anywhere (the writer never serializes the
//! uncompressed field, only the compressed payload), so rather than a
//! `Write`-wrapping accumulator this module exposes a buffer-based one
//! that plays the same running-checksum role directly.

use crc::{CRC_64_XZ, Crc};

static CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// Computes the CRC64 of a byte slice directly.
pub fn crc64(data: &[u8]) -> u64 {
    CRC64.checksum(data)
}

/// An incremental CRC64 accumulator over raw field bytes that are never
/// written anywhere themselves, as in the writer-side field CRC accounting
/// of §4.3 step 2.
#[derive(Clone, Debug, Default)]
pub(crate) struct Crc64Accumulator {
    buf: Vec<u8>,
}

impl Crc64Accumulator {
    pub(crate) fn update(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn finish(&self) -> u64 {
        CRC64.checksum(&self.buf)
    }

    pub(crate) fn reset(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc64_is_deterministic() {
        let a = crc64(b"ACGTACGT");
        let b = crc64(b"ACGTACGT");
        assert_eq!(a, b);
    }

    #[test]
    fn test_crc64_distinguishes_content() {
        assert_ne!(crc64(b"ACGT"), crc64(b"TGCA"));
    }

    #[test]
    fn test_accumulator_matches_direct_computation() {
        let mut acc = Crc64Accumulator::default();
        acc.update(b"ACGT");
        acc.update(b"ACGT");
        assert_eq!(acc.finish(), crc64(b"ACGTACGT"));
    }
}
