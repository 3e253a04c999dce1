//! Container framing: the fixed prefix, optional reference binding,
//! optional assembly parameter, and the auxiliary payload (§4.5, §4.6,
//! §6 "Container byte layout").

use std::io::{Read, Write};
use std::io::{self};

use crate::error::{bad_magic, unexpected_eof};
use crate::num::{read_bytes_u64, read_u8, read_u64, write_bytes_u64, write_u8, write_u64};
use crate::version::Version;

/// The fixed 6-byte magic (§6): `FF 51 55 49 50 00`.
pub(crate) const MAGIC: [u8; 6] = [0xFF, b'Q', b'U', b'I', b'P', 0x00];

const FLAG_REFERENCE: u8 = 0b0000_0001;
const FLAG_ASSEMBLY: u8 = 0b0000_0010;

/// Bit 0: reference-based sequence mode. Bit 1: assembly-based sequence
/// mode (§4.5).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Flags {
    pub(crate) reference_based: bool,
    pub(crate) assembly_based: bool,
}

impl Flags {
    fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.reference_based {
            byte |= FLAG_REFERENCE;
        }
        if self.assembly_based {
            byte |= FLAG_ASSEMBLY;
        }
        byte
    }

    fn from_byte(byte: u8) -> Self {
        Self {
            reference_based: byte & FLAG_REFERENCE != 0,
            assembly_based: byte & FLAG_ASSEMBLY != 0,
        }
    }
}

/// Writes the 8-byte magic/version/flags prefix (§4.5).
pub(crate) fn write_prefix<W: Write>(writer: &mut W, version: Version, flags: Flags) -> io::Result<()> {
    writer.write_all(&MAGIC)?;
    write_u8(writer, version.raw())?;
    write_u8(writer, flags.to_byte())?;
    Ok(())
}

/// Reads and validates the 8-byte fixed prefix (§4.6).
pub(crate) fn read_prefix<R: Read>(reader: &mut R) -> io::Result<(Version, Flags)> {
    let mut magic = [0u8; 6];
    reader
        .read_exact(&mut magic)
        .map_err(|_| unexpected_eof("the container magic"))?;
    if magic != MAGIC {
        return Err(bad_magic());
    }

    let version = Version::from_raw(read_u8(reader)?)?;

    let flags = Flags::from_byte(read_u8(reader)?);

    Ok((version, flags))
}

/// Writes the optional assembly-N parameter (§4.5).
pub(crate) fn write_assembly_n<W: Write>(writer: &mut W, assembly_n: u64) -> io::Result<()> {
    write_u64(writer, assembly_n)
}

/// Reads the assembly-N parameter (§4.6).
pub(crate) fn read_assembly_n<R: Read>(reader: &mut R) -> io::Result<u64> {
    read_u64(reader)
}

/// Writes the auxiliary payload: `u8` format tag, `u64` length, bytes.
pub(crate) fn write_aux<W: Write>(writer: &mut W, fmt: u8, payload: &[u8]) -> io::Result<()> {
    write_u8(writer, fmt)?;
    write_bytes_u64(writer, payload)
}

/// Reads the auxiliary payload.
pub(crate) fn read_aux<R: Read>(reader: &mut R) -> io::Result<(u8, Vec<u8>)> {
    let fmt = read_u8(reader)?;
    let payload = read_bytes_u64(reader)?;
    Ok((fmt, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_round_trip() -> io::Result<()> {
        let mut buf = Vec::new();
        let flags = Flags {
            reference_based: true,
            assembly_based: false,
        };
        write_prefix(&mut buf, Version::V3, flags)?;

        let mut cursor = &buf[..];
        let (version, decoded_flags) = read_prefix(&mut cursor)?;
        assert_eq!(version, Version::V3);
        assert_eq!(decoded_flags, flags);
        Ok(())
    }

    #[test]
    fn test_magic_bytes_match_spec() {
        assert_eq!(MAGIC, [0xFF, 0x51, 0x55, 0x49, 0x50, 0x00]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let buf = [0u8; 8];
        let mut cursor = &buf[..];
        let err = read_prefix(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_flags_round_trip_both_bits() {
        let flags = Flags {
            reference_based: true,
            assembly_based: true,
        };
        assert_eq!(Flags::from_byte(flags.to_byte()), flags);
    }

    #[test]
    fn test_aux_round_trip() -> io::Result<()> {
        let mut buf = Vec::new();
        write_aux(&mut buf, 7, b"hello")?;

        let mut cursor = &buf[..];
        let (fmt, payload) = read_aux(&mut cursor)?;
        assert_eq!(fmt, 7);
        assert_eq!(payload, b"hello");
        Ok(())
    }
}
