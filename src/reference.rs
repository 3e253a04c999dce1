//! Reference set (§4.2).
//!
//! An ordered, name-indexed collection of two-bit-packed nucleotide
//! sequences with a canonical CRC64 fingerprint that binds a compressed
//! stream to the exact reference it was produced against. Reference sets
//! are built once, at open time, and are immutable thereafter (§3
//! "Lifecycles").

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Write},
    path::Path,
};

use crate::{
    crc64,
    error::{malformed_fasta, ref_mismatch, ref_missing},
    num::{read_bytes_u32, read_u32, read_u64, write_bytes_u32, write_u32, write_u64},
};

/// One named sequence in a [`ReferenceSet`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferenceEntry {
    name: Vec<u8>,
    sequence: Vec<u8>,
}

impl ReferenceEntry {
    /// Returns the entry's name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Returns the entry's raw nucleotide sequence.
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }
}

/// An ordered collection of [`ReferenceEntry`] values plus a display-only
/// source filename.
///
/// Invariant: entries are unique by name and sorted byte-lexicographically,
/// so [`ReferenceSet::get`] can binary search.
#[derive(Clone, Debug, Default)]
pub struct ReferenceSet {
    entries: Vec<ReferenceEntry>,
    filename: String,
}

const NUCLEOTIDES: &[u8] = b"ACGTNacgtn";

impl ReferenceSet {
    /// Creates an empty reference set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a reference set from a FASTA file.
    ///
    /// Header lines begin with `>`; a name is the header text up to (but
    /// not including) the first space or end of line, and must be unique
    /// across the file. Sequence lines may only contain characters in the
    /// nucleotide alphabet. Entries are sorted by name after loading.
    pub fn load_fasta<P>(path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::load_fasta_from(BufReader::new(file))
    }

    /// Loads a reference set from any buffered FASTA source.
    pub fn load_fasta_from<R>(mut reader: R) -> io::Result<Self>
    where
        R: BufRead,
    {
        let mut entries: Vec<ReferenceEntry> = Vec::new();
        let mut current_name: Option<Vec<u8>> = None;
        let mut current_sequence: Vec<u8> = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                break;
            }

            let trimmed = line.trim_end_matches(['\n', '\r']);

            if let Some(header) = trimmed.strip_prefix('>') {
                if let Some(name) = current_name.take() {
                    entries.push(ReferenceEntry {
                        name,
                        sequence: std::mem::take(&mut current_sequence),
                    });
                }

                let name = header
                    .split(' ')
                    .next()
                    .unwrap_or_default()
                    .as_bytes()
                    .to_vec();
                current_name = Some(name);
            } else {
                if current_name.is_none() {
                    return Err(malformed_fasta("sequence line before any header line"));
                }

                for &b in trimmed.as_bytes() {
                    if !NUCLEOTIDES.contains(&b) {
                        return Err(malformed_fasta(format!(
                            "invalid character {:?} in sequence line",
                            b as char
                        )));
                    }
                }

                current_sequence.extend_from_slice(trimmed.as_bytes());
            }
        }

        if let Some(name) = current_name.take() {
            entries.push(ReferenceEntry {
                name,
                sequence: current_sequence,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        for pair in entries.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(malformed_fasta(format!(
                    "duplicate reference name: {:?}",
                    String::from_utf8_lossy(&pair[0].name)
                )));
            }
        }

        Ok(Self {
            entries,
            filename: String::new(),
        })
    }

    /// Sets the display-hint source filename (informational only; not part
    /// of the CRC64 fingerprint).
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the names of all entries, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|e| e.name.as_slice())
    }

    /// Looks up an entry by name via binary search.
    pub fn get(&self, name: &[u8]) -> Option<&ReferenceEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_slice().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Computes the canonical CRC64 fingerprint: for each entry in sorted
    /// order, the raw name bytes followed by a canonical two-bit encoding
    /// of its sequence, all concatenated and checksummed as one buffer.
    pub fn crc64(&self) -> u64 {
        let mut buf = Vec::new();

        for entry in &self.entries {
            buf.extend_from_slice(&entry.name);
            buf.extend(pack_two_bit(&entry.sequence));
        }

        crc64::crc64(&buf)
    }

    /// Serializes the reference binding (§4.2 `write_binding`).
    pub fn write_binding<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        write_u64(writer, self.crc64())?;
        write_bytes_u32(writer, self.filename.as_bytes())?;

        let n_entries = u32::try_from(self.entries.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        write_u32(writer, n_entries)?;

        for entry in &self.entries {
            write_bytes_u32(writer, &entry.name)?;

            let seq_len = u64::try_from(entry.sequence.len())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            write_u64(writer, seq_len)?;
        }

        Ok(())
    }

    /// Verifies a reference binding read from `reader` against `self`.
    ///
    /// Compares the CRC64 fingerprint first (a mismatch is fatal regardless
    /// of anything else), discards the filename bytes (informational, may
    /// legitimately differ across machines), then checks entry count,
    /// per-entry name length, name bytes, and sequence length.
    pub fn verify_binding<R>(&self, reader: &mut R) -> io::Result<()>
    where
        R: Read,
    {
        let expected_crc64 = read_u64(reader)?;
        let _filename = read_bytes_u32(reader)?;

        if expected_crc64 != self.crc64() {
            return Err(ref_mismatch("CRC64 fingerprint does not match"));
        }

        let n_entries = read_u32(reader)? as usize;
        if n_entries != self.entries.len() {
            return Err(ref_mismatch("entry count does not match"));
        }

        for entry in &self.entries {
            let name = read_bytes_u32(reader)?;
            if name != entry.name {
                return Err(ref_mismatch("entry name does not match"));
            }

            let seq_len = read_u64(reader)? as usize;
            if seq_len != entry.sequence.len() {
                return Err(ref_mismatch("entry sequence length does not match"));
            }
        }

        Ok(())
    }
}

/// Verifies a reference binding, requiring that a reference set was
/// supplied at all (§7 `RefMissing`).
pub(crate) fn verify_binding_or_missing<R>(
    reference_set: Option<&ReferenceSet>,
    reader: &mut R,
) -> io::Result<()>
where
    R: Read,
{
    match reference_set {
        Some(reference_set) => reference_set.verify_binding(reader),
        None => Err(ref_missing()),
    }
}

/// Packs a nucleotide sequence into a canonical two-bit-per-base encoding.
///
/// `A`/`a` => `00`, `C`/`c` => `01`, `G`/`g` => `10`, `T`/`t` => `11`. `N`/`n`
/// (and, defensively, anything else that slipped past FASTA validation)
/// packs as `00`; the fingerprint is a content hash, not a lossless
/// encoding, so this is an acceptable canonicalization for that purpose.
/// Bits are packed MSB-first within each byte; the final byte is
/// zero-padded.
pub(crate) fn pack_two_bit(sequence: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(sequence.len().div_ceil(4));
    let mut byte = 0u8;
    let mut bits_filled = 0u8;

    for &base in sequence {
        let code = two_bit_code(base);
        byte = (byte << 2) | code;
        bits_filled += 2;

        if bits_filled == 8 {
            packed.push(byte);
            byte = 0;
            bits_filled = 0;
        }
    }

    if bits_filled > 0 {
        byte <<= 8 - bits_filled;
        packed.push(byte);
    }

    packed
}

fn two_bit_code(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => 0b00,
        b'C' => 0b01,
        b'G' => 0b10,
        b'T' => 0b11,
        _ => 0b00,
    }
}
