//! Fixed-width, big-endian integer primitives (§4.1).
//!
//! Every multi-byte integer on the wire is big-endian and unsigned, in one
//! of three widths. There is no alignment or padding anywhere in the
//! container, so these are the only numeric codecs the format needs.

use std::io::{self, Read, Write};

use crate::error::unexpected_eof;

pub(crate) fn read_u8<R>(reader: &mut R) -> io::Result<u8>
where
    R: Read,
{
    let mut buf = [0; 1];
    reader
        .read_exact(&mut buf)
        .map_err(|_| unexpected_eof("a u8"))?;
    Ok(buf[0])
}

pub(crate) fn read_u32<R>(reader: &mut R) -> io::Result<u32>
where
    R: Read,
{
    let mut buf = [0; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| unexpected_eof("a u32"))?;
    Ok(u32::from_be_bytes(buf))
}

pub(crate) fn read_u64<R>(reader: &mut R) -> io::Result<u64>
where
    R: Read,
{
    let mut buf = [0; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|_| unexpected_eof("a u64"))?;
    Ok(u64::from_be_bytes(buf))
}

pub(crate) fn write_u8<W>(writer: &mut W, n: u8) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(&[n])
}

pub(crate) fn write_u32<W>(writer: &mut W, n: u32) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(&n.to_be_bytes())
}

pub(crate) fn write_u64<W>(writer: &mut W, n: u64) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(&n.to_be_bytes())
}

/// Reads a length-prefixed (`u32`) byte buffer.
pub(crate) fn read_bytes_u32<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: Read,
{
    let len = read_u32(reader)? as usize;
    let mut buf = vec![0; len];
    reader
        .read_exact(&mut buf)
        .map_err(|_| unexpected_eof("a length-prefixed byte buffer"))?;
    Ok(buf)
}

/// Writes a length-prefixed (`u32`) byte buffer.
pub(crate) fn write_bytes_u32<W>(writer: &mut W, buf: &[u8]) -> io::Result<()>
where
    W: Write,
{
    let len = u32::try_from(buf.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_u32(writer, len)?;
    writer.write_all(buf)
}

/// Reads a length-prefixed (`u64`) byte buffer (used for the auxiliary
/// payload, whose length is not bounded to 32 bits).
pub(crate) fn read_bytes_u64<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: Read,
{
    let len = read_u64(reader)? as usize;
    let mut buf = vec![0; len];
    reader
        .read_exact(&mut buf)
        .map_err(|_| unexpected_eof("a length-prefixed byte buffer"))?;
    Ok(buf)
}

/// Writes a length-prefixed (`u64`) byte buffer.
pub(crate) fn write_bytes_u64<W>(writer: &mut W, buf: &[u8]) -> io::Result<()>
where
    W: Write,
{
    write_u64(writer, buf.len() as u64)?;
    writer.write_all(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_round_trip() -> io::Result<()> {
        let mut buf = Vec::new();
        write_u8(&mut buf, 0xab)?;
        assert_eq!(buf, [0xab]);
        assert_eq!(read_u8(&mut &buf[..])?, 0xab);
        Ok(())
    }

    #[test]
    fn test_u32_is_big_endian() -> io::Result<()> {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x0102_0304)?;
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(read_u32(&mut &buf[..])?, 0x0102_0304);
        Ok(())
    }

    #[test]
    fn test_u64_is_big_endian() -> io::Result<()> {
        let mut buf = Vec::new();
        write_u64(&mut buf, 0x0102_0304_0506_0708)?;
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        assert_eq!(read_u64(&mut &buf[..])?, 0x0102_0304_0506_0708);
        Ok(())
    }

    #[test]
    fn test_short_read_is_unexpected_eof() {
        let buf = [0x00u8, 0x01];
        let err = read_u32(&mut &buf[..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_bytes_u32_round_trip() -> io::Result<()> {
        let mut buf = Vec::new();
        write_bytes_u32(&mut buf, b"noodle")?;
        assert_eq!(buf, [0x00, 0x00, 0x00, 0x06, b'n', b'o', b'o', b'd', b'l', b'e']);
        assert_eq!(read_bytes_u32(&mut &buf[..])?, b"noodle");
        Ok(())
    }

    #[test]
    fn test_bytes_u64_round_trip() -> io::Result<()> {
        let mut buf = Vec::new();
        write_bytes_u64(&mut buf, b"payload")?;
        assert_eq!(read_bytes_u64(&mut &buf[..])?, b"payload");
        Ok(())
    }
}
