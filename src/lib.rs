//! A block-framed compressor/decompressor for high-throughput DNA
//! sequencing read streams.
//!
//! A stream is a sequence of independently-decodable blocks (§4), each
//! holding a run of reads grouped into fixed-size chunks. Four field
//! codecs — one each for read identifiers, auxiliary tags, nucleotide
//! sequence, and quality scores — compress their field across an entire
//! chunk at a time, concurrently with one another when the `parallel`
//! feature is enabled. Per-field CRC64 checksums and a magic/version
//! prefix guard the container against silent corruption and format drift.
//!
//! Encoding and decoding a field's bytes is this crate's job; producing
//! those bytes from a FASTQ/SAM/BAM record, or driving a CLI, is not —
//! [`Read`] is a bare four-field record, deliberately decoupled from any
//! particular upstream file format.
//!
//! ```no_run
//! use std::io::Cursor;
//! use quip::io::Writer;
//! use quip::Read;
//!
//! # fn main() -> std::io::Result<()> {
//! let mut buf = Vec::new();
//! let mut writer = Writer::new(Cursor::new(&mut buf))?;
//! writer.write_read(Read::new(b"r1".to_vec(), Vec::new(), b"ACGT".to_vec(), b"IIII".to_vec())?)?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

mod chunk;
mod codecs;
mod container;
mod crc64;
mod error;
pub mod io;
mod num;
mod read;
mod reference;
mod rle;
mod version;
mod warning;

pub use read::{AuxTag, Read};
pub use reference::{ReferenceEntry, ReferenceSet};
pub use version::Version;
pub use warning::{Field, Warning};
