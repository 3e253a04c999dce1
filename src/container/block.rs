//! The block pipeline (§4.3, §4.4): the writer and reader halves that
//! group chunks into blocks, drive the four per-field codecs, and frame
//! each block on the wire.

use std::io::{self, Read, Write};

use crate::chunk::Chunk;
use crate::codecs::{
    AuxDecoder, AuxEncoder, IdDecoder, IdEncoder, QualDecoder, QualEncoder, SeqDecoder, SeqEncoder,
};
use crate::codecs::{AuxFieldDecoder, AuxFieldEncoder};
use crate::codecs::{IdFieldDecoder, IdFieldEncoder};
use crate::codecs::{QualFieldDecoder, QualFieldEncoder};
use crate::codecs::{SeqFieldDecoder, SeqFieldEncoder};
use crate::crc64::Crc64Accumulator;
use crate::error::{codec_failure, qual_scheme_overflow, unexpected_eof};
use crate::num::{read_u32, write_u32};
use crate::read::{AuxTag, Read as ReadRecord, aux_bytes, aux_raw_bytes};
use crate::rle::{RunLengthCursor, RunLengthList, read_rle, write_rle};
use crate::warning::{Field, Warning};

/// A block boundary triggers when buffered bases exceed this (§3).
pub(crate) const BLOCK_THRESHOLD: u64 = 5_000_000;

/// Quality scheme window width (§3).
const QUAL_WINDOW: u32 = 64;

/// The lowest/highest accepted quality byte (§9 Open Questions).
const QUAL_MIN: u8 = 33;
const QUAL_MAX: u8 = 126;

/// Before the first read, the active scheme's base is `'!'` (§4.3).
const INITIAL_QUAL_BASE: u8 = b'!';

fn validate_qual_range(min: u8, max: u8) -> io::Result<()> {
    if min < QUAL_MIN || max > QUAL_MAX {
        return Err(qual_scheme_overflow(format!(
            "quality byte out of [{QUAL_MIN}, {QUAL_MAX}] range (observed [{min}, {max}])"
        )));
    }
    Ok(())
}

/// The writer half of the block pipeline: accumulates reads into a
/// chunk, flushes chunks into a block's running state, and frames a
/// block once the threshold is exceeded.
pub(crate) struct BlockWriter {
    chunk: Chunk,

    buffered_reads: u32,
    buffered_bases: u64,

    readlen: RunLengthList<u32>,
    qual_scheme: RunLengthList<u8>,
    active_base: u8,
    active_run: u32,

    id_enc: Box<dyn IdFieldEncoder + Send>,
    aux_enc: Box<dyn AuxFieldEncoder + Send>,
    seq_enc: Box<dyn SeqFieldEncoder + Send>,
    qual_enc: Box<dyn QualFieldEncoder + Send>,

    id_bytes: u64,
    aux_bytes: u64,
    seq_bytes: u64,
    qual_bytes: u64,

    id_crc: Crc64Accumulator,
    aux_crc: Crc64Accumulator,
    seq_crc: Crc64Accumulator,
    qual_crc: Crc64Accumulator,
}

impl BlockWriter {
    pub(crate) fn new(chunk_capacity: usize) -> Self {
        Self {
            chunk: Chunk::new(chunk_capacity),
            buffered_reads: 0,
            buffered_bases: 0,
            readlen: RunLengthList::new(),
            qual_scheme: RunLengthList::new(),
            active_base: INITIAL_QUAL_BASE,
            active_run: 0,
            id_enc: Box::new(IdEncoder::new()),
            aux_enc: Box::new(AuxEncoder::new()),
            seq_enc: Box::new(SeqEncoder::new()),
            qual_enc: Box::new(QualEncoder::new()),
            id_bytes: 0,
            aux_bytes: 0,
            seq_bytes: 0,
            qual_bytes: 0,
            id_crc: Crc64Accumulator::default(),
            aux_crc: Crc64Accumulator::default(),
            seq_crc: Crc64Accumulator::default(),
            qual_crc: Crc64Accumulator::default(),
        }
    }

    /// Admits one read, flushing a block and/or the current chunk first
    /// if either is already at capacity (§4.3 "Admission of a read").
    pub(crate) fn write_read<W: Write>(
        &mut self,
        read: ReadRecord,
        writer: &mut W,
    ) -> io::Result<()> {
        if self.buffered_bases > BLOCK_THRESHOLD {
            self.flush_block(writer)?;
        }

        if self.chunk.is_full() {
            self.flush_chunk()?;
        }

        self.chunk.push(read);
        Ok(())
    }

    /// Flushes any partial chunk and the final block, then writes the
    /// stream terminator (§4.5 "On close").
    pub(crate) fn close<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        if !self.chunk.is_empty() {
            self.flush_chunk()?;
        }
        if self.buffered_reads > 0 {
            self.flush_block(writer)?;
        }
        write_u32(writer, 0)
    }

    fn flush_chunk(&mut self) -> io::Result<()> {
        let slice_min_max = self
            .chunk
            .as_slice()
            .iter()
            .flat_map(ReadRecord::qual)
            .copied()
            .fold(None, |acc: Option<(u8, u8)>, b| match acc {
                None => Some((b, b)),
                Some((lo, hi)) => Some((lo.min(b), hi.max(b))),
            });

        if let Some((min, max)) = slice_min_max {
            validate_qual_range(min, max)?;

            let run = u32::try_from(self.chunk.len())
                .map_err(|e| codec_failure("qual_scheme", e))?;

            if self.active_run == 0 || min < self.active_base || u32::from(max) >= u32::from(self.active_base) + QUAL_WINDOW {
                self.qual_scheme.push_entry(min, run);
                self.active_base = min;
                self.active_run = run;
            } else {
                self.qual_scheme.extend_last(run);
                self.active_run += run;
            }
        }
        self.qual_enc.set_base_qual(self.active_base);

        encode_chunk(
            self.chunk.as_slice(),
            &mut *self.id_enc,
            &mut *self.aux_enc,
            &mut *self.seq_enc,
            &mut *self.qual_enc,
            &mut self.id_crc,
            &mut self.aux_crc,
            &mut self.seq_crc,
            &mut self.qual_crc,
        )?;

        for read in self.chunk.as_slice() {
            self.id_bytes += read.id().len() as u64;
            self.aux_bytes += aux_bytes(read.aux()) as u64;
            self.seq_bytes += read.seq().len() as u64;
            self.qual_bytes += read.qual().len() as u64;
            self.readlen.push_one(read.read_length() as u32);
        }

        self.buffered_reads += self.chunk.len() as u32;
        self.buffered_bases += self.chunk.as_slice().iter().map(|r| r.read_length() as u64).sum::<u64>();

        self.chunk.reset();
        Ok(())
    }

    fn flush_block<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        write_u32(writer, self.buffered_reads)?;
        write_u32(writer, self.buffered_bases as u32)?;

        write_rle(writer, &self.readlen, |w, v| write_u32(w, v))?;
        write_rle(writer, &self.qual_scheme, |w, v| w.write_all(&[v]))?;

        let id_compressed_len = self.id_enc.finish()?;
        let aux_compressed_len = self.aux_enc.finish()?;
        let seq_compressed_len = self.seq_enc.finish()?;
        let qual_compressed_len = self.qual_enc.finish()?;

        write_field_accounting(writer, self.id_bytes, id_compressed_len, self.id_crc.finish())?;
        write_field_accounting(writer, self.aux_bytes, aux_compressed_len, self.aux_crc.finish())?;
        write_field_accounting(writer, self.seq_bytes, seq_compressed_len, self.seq_crc.finish())?;
        write_field_accounting(writer, self.qual_bytes, qual_compressed_len, self.qual_crc.finish())?;

        self.id_enc.flush(writer)?;
        self.aux_enc.flush(writer)?;
        self.seq_enc.flush(writer)?;
        self.qual_enc.flush(writer)?;

        self.buffered_reads = 0;
        self.buffered_bases = 0;
        self.id_bytes = 0;
        self.aux_bytes = 0;
        self.seq_bytes = 0;
        self.qual_bytes = 0;
        self.id_crc.reset();
        self.aux_crc.reset();
        self.seq_crc.reset();
        self.qual_crc.reset();
        self.readlen.clear();
        self.qual_scheme.reset_with_carry(self.active_base);
        self.active_run = 0;

        Ok(())
    }
}

fn write_field_accounting<W: Write>(
    writer: &mut W,
    uncompressed: u64,
    compressed: usize,
    crc: u64,
) -> io::Result<()> {
    write_u32(writer, uncompressed as u32)?;
    write_u32(writer, compressed as u32)?;
    writer.write_all(&crc.to_be_bytes())
}

#[allow(clippy::too_many_arguments)]
fn encode_chunk(
    slice: &[ReadRecord],
    id_enc: &mut (dyn IdFieldEncoder + Send),
    aux_enc: &mut (dyn AuxFieldEncoder + Send),
    seq_enc: &mut (dyn SeqFieldEncoder + Send),
    qual_enc: &mut (dyn QualFieldEncoder + Send),
    id_crc: &mut Crc64Accumulator,
    aux_crc: &mut Crc64Accumulator,
    seq_crc: &mut Crc64Accumulator,
    qual_crc: &mut Crc64Accumulator,
) -> io::Result<()> {
    #[cfg(feature = "parallel")]
    {
        let mut id_result = Ok(());
        let mut aux_result = Ok(());
        let mut seq_result = Ok(());
        let mut qual_result = Ok(());

        rayon::scope(|s| {
            s.spawn(|_| id_result = encode_id(slice, id_enc, id_crc));
            s.spawn(|_| aux_result = encode_aux(slice, aux_enc, aux_crc));
            s.spawn(|_| seq_result = encode_seq(slice, seq_enc, seq_crc));
            s.spawn(|_| qual_result = encode_qual(slice, qual_enc, qual_crc));
        });

        id_result?;
        aux_result?;
        seq_result?;
        qual_result?;
    }

    #[cfg(not(feature = "parallel"))]
    {
        encode_id(slice, id_enc, id_crc)?;
        encode_aux(slice, aux_enc, aux_crc)?;
        encode_seq(slice, seq_enc, seq_crc)?;
        encode_qual(slice, qual_enc, qual_crc)?;
    }

    Ok(())
}

fn encode_id(
    slice: &[ReadRecord],
    enc: &mut (dyn IdFieldEncoder + Send),
    crc: &mut Crc64Accumulator,
) -> io::Result<()> {
    for read in slice {
        crc.update(read.id());
        enc.accept(read.id())?;
    }
    Ok(())
}

fn encode_aux(
    slice: &[ReadRecord],
    enc: &mut (dyn AuxFieldEncoder + Send),
    crc: &mut Crc64Accumulator,
) -> io::Result<()> {
    for read in slice {
        crc.update(&aux_raw_bytes(read.aux()));
        enc.accept(read.aux())?;
    }
    Ok(())
}

fn encode_seq(
    slice: &[ReadRecord],
    enc: &mut (dyn SeqFieldEncoder + Send),
    crc: &mut Crc64Accumulator,
) -> io::Result<()> {
    for read in slice {
        crc.update(read.seq());
        enc.accept(read.seq())?;
    }
    Ok(())
}

fn encode_qual(
    slice: &[ReadRecord],
    enc: &mut (dyn QualFieldEncoder + Send),
    crc: &mut Crc64Accumulator,
) -> io::Result<()> {
    for read in slice {
        crc.update(read.qual());
        enc.accept(read.qual())?;
    }
    Ok(())
}

/// The reader half of the block pipeline.
pub(crate) struct BlockReader {
    id_dec: Box<dyn IdFieldDecoder + Send>,
    aux_dec: Box<dyn AuxFieldDecoder + Send>,
    seq_dec: Box<dyn SeqFieldDecoder + Send>,
    qual_dec: Box<dyn QualFieldDecoder + Send>,

    reads_in_block: u32,
    bases_in_block: u32,
    reads_consumed: u32,

    readlen: RunLengthList<u32>,
    readlen_pos: (usize, u32),
    qual_scheme: RunLengthList<u8>,
    qual_scheme_pos: (usize, u32),

    expected_id_crc: u64,
    expected_aux_crc: u64,
    expected_seq_crc: u64,
    expected_qual_crc: u64,

    id_crc: Crc64Accumulator,
    aux_crc: Crc64Accumulator,
    seq_crc: Crc64Accumulator,
    qual_crc: Crc64Accumulator,

    block_index: u64,
    end_of_stream: bool,
}

impl BlockReader {
    pub(crate) fn new() -> Self {
        Self {
            id_dec: Box::new(IdDecoder::new()),
            aux_dec: Box::new(AuxDecoder::new()),
            seq_dec: Box::new(SeqDecoder::new()),
            qual_dec: Box::new(QualDecoder::new()),
            reads_in_block: 0,
            bases_in_block: 0,
            reads_consumed: 0,
            readlen: RunLengthList::new(),
            readlen_pos: (0, 0),
            qual_scheme: RunLengthList::new(),
            qual_scheme_pos: (0, 0),
            expected_id_crc: 0,
            expected_aux_crc: 0,
            expected_seq_crc: 0,
            expected_qual_crc: 0,
            id_crc: Crc64Accumulator::default(),
            aux_crc: Crc64Accumulator::default(),
            seq_crc: Crc64Accumulator::default(),
            qual_crc: Crc64Accumulator::default(),
            block_index: 0,
            end_of_stream: false,
        }
    }

    pub(crate) fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// True once every read of the current block has been consumed.
    fn block_exhausted(&self) -> bool {
        self.reads_consumed >= self.reads_in_block
    }

    /// Reads the next block header, completing the previous block (CRC
    /// check) first if one was in progress. Returns `Ok(false)` once the
    /// terminator has been seen.
    pub(crate) fn advance_block<R: Read>(
        &mut self,
        reader: &mut R,
        warnings: &mut Vec<Warning>,
    ) -> io::Result<bool> {
        if self.reads_in_block > 0 {
            self.complete_block(warnings);
        }

        self.reads_in_block = read_u32(reader)?;
        if self.reads_in_block == 0 {
            self.end_of_stream = true;
            return Ok(false);
        }

        self.bases_in_block = read_u32(reader)?;
        self.readlen = read_rle(reader, self.reads_in_block, |r| read_u32(r))?;
        self.qual_scheme = read_rle(reader, self.reads_in_block, |r| {
            let mut b = [0u8; 1];
            r.read_exact(&mut b).map_err(|_| unexpected_eof("a qual_scheme byte"))?;
            Ok(b[0])
        })?;

        let (id_unc, id_comp, id_crc) = read_field_accounting(reader)?;
        let (aux_unc, aux_comp, aux_crc) = read_field_accounting(reader)?;
        let (seq_unc, seq_comp, seq_crc) = read_field_accounting(reader)?;
        let (qual_unc, qual_comp, qual_crc) = read_field_accounting(reader)?;
        let _ = (id_unc, aux_unc, seq_unc, qual_unc);

        self.expected_id_crc = id_crc;
        self.expected_aux_crc = aux_crc;
        self.expected_seq_crc = seq_crc;
        self.expected_qual_crc = qual_crc;

        let id_payload = read_payload(reader, id_comp)?;
        let aux_payload = read_payload(reader, aux_comp)?;
        let seq_payload = read_payload(reader, seq_comp)?;
        let qual_payload = read_payload(reader, qual_comp)?;

        self.id_dec.reset();
        self.id_dec.start(&mut &id_payload[..])?;
        self.aux_dec.reset();
        self.aux_dec.start(&mut &aux_payload[..])?;
        self.seq_dec.reset();
        self.seq_dec.start(&mut &seq_payload[..])?;
        self.qual_dec.reset();
        self.qual_dec.start(&mut &qual_payload[..])?;

        self.readlen_pos = (0, 0);
        self.qual_scheme_pos = (0, 0);
        self.reads_consumed = 0;

        self.id_crc.reset();
        self.aux_crc.reset();
        self.seq_crc.reset();
        self.qual_crc.reset();

        let mut scheme_cursor =
            RunLengthCursor::with_state(self.qual_scheme.entries(), 0, 0);
        if let Some(base) = scheme_cursor.peek() {
            self.qual_dec.set_base_qual(base);
        }

        Ok(true)
    }

    /// Decodes up to `Chunk::capacity()` reads remaining in the current
    /// block into `chunk`.
    pub(crate) fn decode_chunk(&mut self, chunk: &mut Chunk) -> io::Result<()> {
        let remaining = self.reads_in_block - self.reads_consumed;
        let count = remaining.min(chunk.capacity() as u32) as usize;
        if count == 0 {
            return Ok(());
        }

        let readlen_entries = self.readlen.entries();
        let scheme_entries = self.qual_scheme.entries();
        let seq_cursor_start = RunLengthCursor::with_state(readlen_entries, self.readlen_pos.0, self.readlen_pos.1);
        let qual_len_cursor_start = seq_cursor_start;
        let qual_scheme_cursor_start =
            RunLengthCursor::with_state(scheme_entries, self.qual_scheme_pos.0, self.qual_scheme_pos.1);

        let id_dec = &mut *self.id_dec;
        let aux_dec = &mut *self.aux_dec;
        let seq_dec = &mut *self.seq_dec;
        let qual_dec = &mut *self.qual_dec;
        let id_crc = &mut self.id_crc;
        let aux_crc = &mut self.aux_crc;
        let seq_crc = &mut self.seq_crc;
        let qual_crc = &mut self.qual_crc;

        let mut id_result: io::Result<Vec<Vec<u8>>> = Ok(Vec::new());
        let mut aux_result: io::Result<Vec<Vec<AuxTag>>> = Ok(Vec::new());
        let mut seq_result: io::Result<Vec<Vec<u8>>> = Ok(Vec::new());
        let mut qual_result: io::Result<Vec<Vec<u8>>> = Ok(Vec::new());

        #[cfg(feature = "parallel")]
        {
            rayon::scope(|s| {
                s.spawn(|_| id_result = decode_id(id_dec, count, id_crc));
                s.spawn(|_| aux_result = decode_aux(aux_dec, count, aux_crc));
                s.spawn(|_| seq_result = decode_seq(seq_dec, count, seq_crc, seq_cursor_start));
                s.spawn(|_| {
                    qual_result = decode_qual(qual_dec, count, qual_crc, qual_len_cursor_start, qual_scheme_cursor_start)
                });
            });
        }

        #[cfg(not(feature = "parallel"))]
        {
            id_result = decode_id(id_dec, count, id_crc);
            aux_result = decode_aux(aux_dec, count, aux_crc);
            seq_result = decode_seq(seq_dec, count, seq_crc, seq_cursor_start);
            qual_result = decode_qual(qual_dec, count, qual_crc, qual_len_cursor_start, qual_scheme_cursor_start);
        }

        let ids = id_result?;
        let auxs = aux_result?;
        let seqs = seq_result?;
        let quals = qual_result?;

        for i in 0..count {
            let read = ReadRecord::new(
                ids[i].clone(),
                auxs[i].clone(),
                seqs[i].clone(),
                quals[i].clone(),
            )?;
            chunk.push(read);
        }

        let mut readlen_cursor = RunLengthCursor::with_state(
            self.readlen.entries(),
            self.readlen_pos.0,
            self.readlen_pos.1,
        );
        let mut scheme_cursor = RunLengthCursor::with_state(
            self.qual_scheme.entries(),
            self.qual_scheme_pos.0,
            self.qual_scheme_pos.1,
        );
        for _ in 0..count {
            readlen_cursor.next();
            scheme_cursor.next();
        }
        self.readlen_pos = readlen_cursor.state();
        self.qual_scheme_pos = scheme_cursor.state();

        self.reads_consumed += count as u32;
        Ok(())
    }

    fn complete_block(&mut self, warnings: &mut Vec<Warning>) {
        let checks = [
            (self.id_crc.finish(), self.expected_id_crc, Field::Id),
            (self.aux_crc.finish(), self.expected_aux_crc, Field::Aux),
            (self.seq_crc.finish(), self.expected_seq_crc, Field::Seq),
            (self.qual_crc.finish(), self.expected_qual_crc, Field::Qual),
        ];

        for (observed, expected, field) in checks {
            if observed != expected {
                warnings.push(Warning::CrcMismatch {
                    block: self.block_index,
                    field,
                });
            }
        }

        self.block_index += 1;
    }

    pub(crate) fn has_pending_reads(&self) -> bool {
        !self.block_exhausted()
    }
}

fn read_field_accounting<R: Read>(reader: &mut R) -> io::Result<(u32, u32, u64)> {
    let uncompressed = read_u32(reader)?;
    let compressed = read_u32(reader)?;
    let mut crc_buf = [0u8; 8];
    reader
        .read_exact(&mut crc_buf)
        .map_err(|_| unexpected_eof("a field CRC64"))?;
    Ok((uncompressed, compressed, u64::from_be_bytes(crc_buf)))
}

fn read_payload<R: Read>(reader: &mut R, len: u32) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .map_err(|_| unexpected_eof("a field's compressed payload"))?;
    Ok(buf)
}

fn decode_id(
    dec: &mut (dyn IdFieldDecoder + Send),
    count: usize,
    crc: &mut Crc64Accumulator,
) -> io::Result<Vec<Vec<u8>>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let bytes = dec.decode()?;
        crc.update(&bytes);
        out.push(bytes);
    }
    Ok(out)
}

fn decode_aux(
    dec: &mut (dyn AuxFieldDecoder + Send),
    count: usize,
    crc: &mut Crc64Accumulator,
) -> io::Result<Vec<Vec<AuxTag>>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let tags = dec.decode()?;
        crc.update(&aux_raw_bytes(&tags));
        out.push(tags);
    }
    Ok(out)
}

fn decode_seq(
    dec: &mut (dyn SeqFieldDecoder + Send),
    count: usize,
    crc: &mut Crc64Accumulator,
    mut cursor: RunLengthCursor<'_, u32>,
) -> io::Result<Vec<Vec<u8>>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let len = cursor
            .next()
            .ok_or_else(|| unexpected_eof("a readlen entry for the sequence decoder"))?
            as usize;
        let bytes = dec.decode(len)?;
        crc.update(&bytes);
        out.push(bytes);
    }
    Ok(out)
}

fn decode_qual(
    dec: &mut (dyn QualFieldDecoder + Send),
    count: usize,
    crc: &mut Crc64Accumulator,
    mut len_cursor: RunLengthCursor<'_, u32>,
    mut scheme_cursor: RunLengthCursor<'_, u8>,
) -> io::Result<Vec<Vec<u8>>> {
    let mut out = Vec::with_capacity(count);
    let mut active_base = None;

    for _ in 0..count {
        let len = len_cursor
            .next()
            .ok_or_else(|| unexpected_eof("a readlen entry for the quality decoder"))?
            as usize;

        let base = scheme_cursor
            .next()
            .ok_or_else(|| unexpected_eof("a qual_scheme entry for the quality decoder"))?;
        if active_base != Some(base) {
            dec.set_base_qual(base);
            active_base = Some(base);
        }

        let bytes = dec.decode(len)?;
        crc.update(&bytes);
        out.push(bytes);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(id: &[u8], seq: &[u8], qual: &[u8]) -> ReadRecord {
        ReadRecord::new(id.to_vec(), Vec::new(), seq.to_vec(), qual.to_vec()).unwrap()
    }

    #[test]
    fn test_round_trip_single_block_single_chunk() -> io::Result<()> {
        let mut writer = BlockWriter::new(16);
        let mut buf = Vec::new();

        for i in 0..10 {
            writer.write_read(
                read(format!("r{i}").as_bytes(), b"ACGT", b"IIII"),
                &mut buf,
            )?;
        }
        writer.close(&mut buf)?;

        let mut cursor = &buf[..];
        let mut reader = BlockReader::new();
        let mut warnings = Vec::new();
        assert!(reader.advance_block(&mut cursor, &mut warnings)?);
        assert_eq!(reader.reads_in_block, 10);
        assert_eq!(reader.bases_in_block, 40);
        assert_eq!(reader.readlen.entries(), &[(4, 10)]);
        assert_eq!(reader.qual_scheme.entries(), &[(b'I', 10)]);

        let mut chunk = Chunk::new(16);
        reader.decode_chunk(&mut chunk)?;
        assert_eq!(chunk.len(), 10);
        for (i, decoded) in chunk.as_slice().iter().enumerate() {
            assert_eq!(decoded.id(), format!("r{i}").as_bytes());
            assert_eq!(decoded.seq(), b"ACGT");
            assert_eq!(decoded.qual(), b"IIII");
        }

        assert!(!reader.advance_block(&mut cursor, &mut warnings)?);
        assert!(warnings.is_empty());
        Ok(())
    }

    #[test]
    fn test_variable_read_lengths_alternate_rle() -> io::Result<()> {
        let mut writer = BlockWriter::new(16);
        let mut buf = Vec::new();

        for i in 0..4 {
            let (seq, qual) = if i % 2 == 0 {
                (vec![b'A'; 50], vec![b'I'; 50])
            } else {
                (vec![b'A'; 51], vec![b'I'; 51])
            };
            writer.write_read(read(b"r", &seq, &qual), &mut buf)?;
        }
        writer.close(&mut buf)?;

        let mut cursor = &buf[..];
        let mut reader = BlockReader::new();
        let mut warnings = Vec::new();
        reader.advance_block(&mut cursor, &mut warnings)?;
        assert_eq!(reader.readlen.entries(), &[(50, 1), (51, 1), (50, 1), (51, 1)]);
        Ok(())
    }

    #[test]
    fn test_empty_container_is_just_terminator() -> io::Result<()> {
        let mut writer = BlockWriter::new(16);
        let mut buf = Vec::new();
        writer.close(&mut buf)?;
        assert_eq!(buf, 0u32.to_be_bytes());
        Ok(())
    }

    #[test]
    fn test_crc_mismatch_produces_one_warning_per_field_per_block_and_continues() -> io::Result<()> {
        // Chunk capacity 2 plus a manually-raised `buffered_bases` forces a
        // block boundary between reads without actually writing
        // `BLOCK_THRESHOLD` bases (§3 "Block").
        let mut writer = BlockWriter::new(2);
        let mut buf = Vec::new();

        for i in 0..3 {
            writer.write_read(read(format!("a{i}").as_bytes(), b"ACGT", b"IIII"), &mut buf)?;
            if i == 2 {
                writer.buffered_bases = BLOCK_THRESHOLD + 1;
            }
        }
        for i in 0..3 {
            writer.write_read(read(format!("b{i}").as_bytes(), b"GGGG", b"####"), &mut buf)?;
        }
        writer.close(&mut buf)?;

        let mut cursor = &buf[..];
        let mut reader = BlockReader::new();
        let mut warnings = Vec::new();

        assert!(reader.advance_block(&mut cursor, &mut warnings)?);
        let mut block0 = Chunk::new(16);
        reader.decode_chunk(&mut block0)?;
        assert_eq!(block0.len(), 2, "only a0/a1 were flushed before the forced block boundary");
        assert!(warnings.is_empty());

        assert!(reader.advance_block(&mut cursor, &mut warnings)?);
        assert!(warnings.is_empty(), "block 0's CRCs should match");

        reader.expected_qual_crc ^= 1;
        let mut block1 = Chunk::new(16);
        reader.decode_chunk(&mut block1)?;
        assert_eq!(block1.len(), 4, "remaining a2/b0/b1/b2 land in block 1");

        assert!(!reader.advance_block(&mut cursor, &mut warnings)?);
        assert_eq!(
            warnings,
            vec![Warning::CrcMismatch {
                block: 1,
                field: Field::Qual,
            }]
        );
        Ok(())
    }

    #[test]
    fn test_rejects_quality_byte_below_printable_range() {
        let mut writer = BlockWriter::new(16);
        let mut buf = Vec::new();
        let err = writer
            .write_read(read(b"r", b"A", &[10]), &mut buf)
            .and_then(|_| writer.close(&mut buf))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
