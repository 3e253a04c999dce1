//! The public compressing writer (§4.5 "Container framing — writer").

use std::io::{self, Write};

use crate::container::{BlockWriter, Flags, write_assembly_n, write_aux, write_prefix};
use crate::io::options::WriterOptions;
use crate::read::Read;
use crate::version::Version;

/// Compresses a stream of [`Read`]s into a quip container.
///
/// Opening a `Writer` immediately emits the fixed prefix and any optional
/// reference binding / assembly parameter / auxiliary payload (§4.5); the
/// final block and stream terminator are emitted on [`Self::close`], or on
/// drop if the caller never calls it explicitly.
pub struct Writer<W> {
    inner: W,
    block_writer: BlockWriter,
    closed: bool,
}

impl<W> Writer<W>
where
    W: Write,
{
    /// Opens a writer with the default options: no reference binding, no
    /// assembly parameter, an empty auxiliary payload, `CHUNK_CAP`-sized
    /// chunks.
    pub fn new(inner: W) -> io::Result<Self> {
        Self::with_options(inner, WriterOptions::default())
    }

    /// Opens a writer with caller-supplied options, built with
    /// [`super::options::WriterBuilder`].
    pub fn with_options(mut inner: W, options: WriterOptions) -> io::Result<Self> {
        let flags = Flags {
            reference_based: options.reference.is_some(),
            assembly_based: options.assembly_n.is_some(),
        };
        write_prefix(&mut inner, Version::default(), flags)?;

        if let Some(reference) = &options.reference {
            reference.write_binding(&mut inner)?;
        }

        if let Some(assembly_n) = options.assembly_n {
            write_assembly_n(&mut inner, assembly_n)?;
        }

        write_aux(&mut inner, options.aux_fmt, &options.aux_payload)?;

        Ok(Self {
            inner,
            block_writer: BlockWriter::new(options.chunk_capacity),
            closed: false,
        })
    }

    /// Admits one read (§4.3 "Admission of a read").
    pub fn write_read(&mut self, read: Read) -> io::Result<()> {
        self.block_writer.write_read(read, &mut self.inner)
    }

    /// Flushes any buffered reads and writes the stream terminator.
    /// Idempotent: a second call is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.block_writer.close(&mut self.inner)?;
        self.closed = true;
        Ok(())
    }
}

impl<W> Drop for Writer<W>
where
    W: Write,
{
    fn drop(&mut self) {
        let _ = self.close();
    }
}
