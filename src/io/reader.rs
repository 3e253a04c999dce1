//! The public decompressing reader (§4.6 "Container framing — reader").

use std::io::{self, Read as IoRead};

use crate::chunk::{CHUNK_CAP, Chunk};
use crate::container::{BlockReader, read_assembly_n, read_aux, read_prefix};
use crate::io::options::ReaderOptions;
use crate::read::Read;
use crate::reference::verify_binding_or_missing;
use crate::version::Version;
use crate::warning::Warning;

/// Decompresses a quip container back into a stream of [`Read`]s.
///
/// Opening a `Reader` reads and validates the fixed prefix, verifies any
/// reference binding against the caller-supplied reference set (fatal if
/// the container is reference-based and none was supplied, or if it was
/// supplied but doesn't match), and reads the optional assembly parameter
/// and the auxiliary payload (§4.6). Reads are then pulled one at a time
/// with [`Self::read_read`], which transparently advances block and chunk
/// boundaries underneath the caller.
pub struct Reader<R> {
    inner: R,
    version: Version,
    assembly_n: Option<u64>,
    aux_fmt: u8,
    aux_payload: Vec<u8>,
    block_reader: BlockReader,
    chunk: Chunk,
    chunk_pos: usize,
    warnings: Vec<Warning>,
}

impl<R> Reader<R>
where
    R: IoRead,
{
    /// Opens a reader with no reference set; fails immediately if the
    /// container turns out to be reference-based (§7 `RefMissing`).
    pub fn new(inner: R) -> io::Result<Self> {
        Self::with_options(inner, ReaderOptions::default())
    }

    /// Opens a reader with caller-supplied options, built with
    /// [`super::options::ReaderBuilder`].
    pub fn with_options(mut inner: R, options: ReaderOptions) -> io::Result<Self> {
        let (version, flags) = read_prefix(&mut inner)?;
        version.require_decodable()?;

        if flags.reference_based {
            verify_binding_or_missing(options.reference.as_ref(), &mut inner)?;
        }

        let assembly_n = if flags.assembly_based {
            Some(read_assembly_n(&mut inner)?)
        } else {
            None
        };

        let (aux_fmt, aux_payload) = read_aux(&mut inner)?;

        Ok(Self {
            inner,
            version,
            assembly_n,
            aux_fmt,
            aux_payload,
            block_reader: BlockReader::new(),
            chunk: Chunk::new(CHUNK_CAP),
            chunk_pos: 0,
            warnings: Vec::new(),
        })
    }

    /// Returns the container's declared version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the assembly-N parameter, if the container is
    /// assembly-based.
    pub fn assembly_n(&self) -> Option<u64> {
        self.assembly_n
    }

    /// Returns the auxiliary payload's format tag and bytes.
    pub fn aux(&self) -> (u8, &[u8]) {
        (self.aux_fmt, &self.aux_payload)
    }

    /// Returns every non-fatal diagnostic observed so far (§7
    /// `CrcMismatch`).
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Pulls the next read, transparently crossing chunk and block
    /// boundaries. Returns `Ok(None)` once the stream terminator has been
    /// read.
    pub fn read_read(&mut self) -> io::Result<Option<Read>> {
        loop {
            if self.chunk_pos < self.chunk.len() {
                let read = self.chunk.as_slice()[self.chunk_pos].clone();
                self.chunk_pos += 1;
                return Ok(Some(read));
            }

            if self.block_reader.is_end_of_stream() {
                return Ok(None);
            }

            if !self.block_reader.has_pending_reads()
                && !self.block_reader.advance_block(&mut self.inner, &mut self.warnings)?
            {
                return Ok(None);
            }

            self.chunk.reset();
            self.block_reader.decode_chunk(&mut self.chunk)?;
            self.chunk_pos = 0;

            if self.chunk.is_empty() {
                return Ok(None);
            }
        }
    }
}
