//! Writer/reader configuration surfaces, in the builder-pattern style
//! `noodles-cram`'s `io::writer::{Options, Builder}` uses.

use crate::chunk::CHUNK_CAP;
use crate::reference::ReferenceSet;

/// Configuration for [`super::writer::Writer`].
#[derive(Debug)]
pub struct WriterOptions {
    pub(crate) chunk_capacity: usize,
    pub(crate) reference: Option<ReferenceSet>,
    pub(crate) assembly_n: Option<u64>,
    pub(crate) aux_fmt: u8,
    pub(crate) aux_payload: Vec<u8>,
}

impl WriterOptions {
    fn new() -> Self {
        Self {
            chunk_capacity: CHUNK_CAP,
            reference: None,
            assembly_n: None,
            aux_fmt: 0,
            aux_payload: Vec::new(),
        }
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a [`WriterOptions`].
#[derive(Debug, Default)]
pub struct WriterBuilder {
    options: WriterOptions,
}

impl WriterBuilder {
    /// Starts from the defaults: `CHUNK_CAP`-sized chunks, no reference
    /// binding, no assembly parameter, an empty auxiliary payload.
    pub fn new() -> Self {
        Self {
            options: WriterOptions::new(),
        }
    }

    /// Sets the reference set the sequence field will be bound to;
    /// turns on the reference-based flag bit (§4.5).
    pub fn set_reference(mut self, reference: ReferenceSet) -> Self {
        self.options.reference = Some(reference);
        self
    }

    /// Sets the assembly-N parameter; turns on the assembly-based flag
    /// bit (§4.5). This flag bit is set independently of
    /// [`Self::set_reference`]'s reference-based flag bit: the two are
    /// not mutually exclusive, and calling both on the same builder sets
    /// both flag bits in the container, not whichever was supplied last.
    pub fn set_assembly_n(mut self, assembly_n: u64) -> Self {
        self.options.assembly_n = Some(assembly_n);
        self
    }

    /// Sets the auxiliary payload (§4.5, §6).
    pub fn set_aux(mut self, fmt: u8, payload: Vec<u8>) -> Self {
        self.options.aux_fmt = fmt;
        self.options.aux_payload = payload;
        self
    }

    /// Overrides the chunk capacity (§3 default `CHUNK_CAP = 5000`).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn set_chunk_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be nonzero");
        self.options.chunk_capacity = capacity;
        self
    }

    /// Consumes the builder, producing the finished options.
    pub fn build(self) -> WriterOptions {
        self.options
    }
}

/// Configuration for [`super::reader::Reader`].
#[derive(Debug, Default)]
pub struct ReaderOptions {
    pub(crate) reference: Option<ReferenceSet>,
}

/// Builds a [`ReaderOptions`].
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    options: ReaderOptions,
}

impl ReaderBuilder {
    /// Starts from the defaults: no reference set supplied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the reference set a reference-based container's
    /// sequence field will be verified against (§4.6).
    pub fn set_reference(mut self, reference: ReferenceSet) -> Self {
        self.options.reference = Some(reference);
        self
    }

    /// Consumes the builder, producing the finished options.
    pub fn build(self) -> ReaderOptions {
        self.options
    }
}
