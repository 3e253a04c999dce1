//! The default quality codec: a two-pass canonical Huffman coder whose
//! code table is rebuilt from scratch at `finish()` time, i.e. once per
//! block, keyed purely on which byte values were actually seen. `
//! set_base_qual` marks the scheme boundary as the contract requires
//! (§3, §4.3 step 1, §4.4 step 3) but this codec's table adapts to the
//! observed byte distribution on its own and does not need the base to
//! pick its alphabet.
//!
//! This is the "adaptive arithmetic quality coder" the field blocks
//! describe, reduced to a simpler, auditable entropy coder: both sit in
//! the same family (model the score distribution, then pack each score
//! down near its information content) and either can occupy this slot
//! without the block pipeline noticing, per the opaque-collaborator
//! contract in §6.
//!
//! Code lengths are assigned by package-merge (Larmore & Hirschberg
//! 1990), not by walking an unbounded binary-heap Huffman tree: the
//! legal quality-byte alphabet has up to 94 distinct values
//! (`QUAL_MIN..=QUAL_MAX` in `container/block.rs`), and a pathological
//! but entirely spec-legal (near-Fibonacci-weighted) frequency
//! distribution over that many symbols can force an unbounded tree to
//! assign a code length past 32 bits — which `BitWriter`/`BitReader`
//! cannot represent. Package-merge is Kraft-valid and length-limited by
//! construction, so no code this coder ever emits can exceed
//! `MAX_CODE_LEN`.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use super::bits::{BitReader, BitWriter};
use crate::error::codec_failure;

#[derive(Debug, Default)]
pub(crate) struct QualEncoder {
    raw: Vec<u8>,
    compressed: Vec<u8>,
    base: u8,
}

impl QualEncoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl super::QualFieldEncoder for QualEncoder {
    fn accept(&mut self, qual: &[u8]) -> io::Result<()> {
        self.raw.extend_from_slice(qual);
        Ok(())
    }

    fn set_base_qual(&mut self, base: u8) {
        self.base = base;
    }

    fn finish(&mut self) -> io::Result<usize> {
        let table = build_code_table(&self.raw);

        let mut header = Vec::new();
        header.extend_from_slice(&(table.len() as u16).to_be_bytes());
        for &(symbol, len) in &table {
            header.push(symbol);
            header.push(len);
        }

        let payload = match table.len() {
            0 => Vec::new(),
            1 => Vec::new(),
            _ => {
                let codes = assign_canonical_codes(&table);
                let mut writer = BitWriter::new();
                for &byte in &self.raw {
                    let &(code, len) = codes.get(&byte).expect("byte covered by code table");
                    writer.write_bits(code, u32::from(len));
                }
                writer.finish()
            }
        };

        let mut raw_out = header;
        raw_out.extend_from_slice(&payload);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw_out)?;
        self.compressed = encoder.finish().map_err(|e| codec_failure("qual", e))?;
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
pub(crate) struct QualDecoder {
    single_symbol: Option<u8>,
    decode_map: HashMap<(u8, u32), u8>,
    max_len: u8,
    packed: Vec<u8>,
    bit_pos: usize,
}

impl QualDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl super::QualFieldDecoder for QualDecoder {
    fn set_base_qual(&mut self, _base: u8) {}

    fn start(&mut self, reader: &mut dyn Read) -> io::Result<()> {
        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed)?;

        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut raw = Vec::new();
        decoder
            .read_to_end(&mut raw)
            .map_err(|e| codec_failure("qual", e))?;

        if raw.len() < 2 {
            return Err(codec_failure("qual", "truncated quality header"));
        }
        let count = u16::from_be_bytes([raw[0], raw[1]]) as usize;
        let mut cursor = 2;
        let mut table = Vec::with_capacity(count);
        for _ in 0..count {
            if cursor + 2 > raw.len() {
                return Err(codec_failure("qual", "truncated quality header entry"));
            }
            table.push((raw[cursor], raw[cursor + 1]));
            cursor += 2;
        }

        self.single_symbol = None;
        self.decode_map.clear();
        self.max_len = 0;
        self.packed.clear();
        self.bit_pos = 0;

        match table.len() {
            0 => {}
            1 => self.single_symbol = Some(table[0].0),
            _ => {
                let codes = assign_canonical_codes(&table);
                for (symbol, &(code, len)) in &codes {
                    self.decode_map.insert((len, code), *symbol);
                    self.max_len = self.max_len.max(len);
                }
                self.packed = raw[cursor..].to_vec();
            }
        }

        Ok(())
    }

    fn decode(&mut self, read_length: usize) -> io::Result<Vec<u8>> {
        if let Some(symbol) = self.single_symbol {
            return Ok(vec![symbol; read_length]);
        }

        if self.decode_map.is_empty() {
            if read_length > 0 {
                return Err(codec_failure(
                    "qual",
                    "decode requested against an empty quality code table",
                ));
            }
            return Ok(Vec::new());
        }

        let mut bits = BitReader::new(&self.packed);
        for _ in 0..self.bit_pos {
            bits.read_bit();
        }

        let mut out = Vec::with_capacity(read_length);
        for _ in 0..read_length {
            let mut code = 0u32;
            let mut len = 0u8;
            loop {
                code = (code << 1) | bits.read_bit();
                len += 1;
                if let Some(&symbol) = self.decode_map.get(&(len, code)) {
                    out.push(symbol);
                    break;
                }
                if len > self.max_len {
                    return Err(codec_failure("qual", "no matching code in quality stream"));
                }
            }
            self.bit_pos += usize::from(len);
        }

        Ok(out)
    }

    fn reset(&mut self) {
        self.single_symbol = None;
        self.decode_map.clear();
        self.max_len = 0;
        self.packed.clear();
        self.bit_pos = 0;
    }
}

/// Maximum canonical code length this codec will ever assign.
///
/// `BitWriter`/`BitReader` pack codes into a `u32`, so any length at or
/// past 32 bits is unrepresentable. A 94-symbol alphabet (the full legal
/// `QUAL_MIN..=QUAL_MAX` range) only needs `ceil(log2(94)) = 7` bits in
/// the balanced case, but an unbounded Huffman tree fed a pathological
/// near-Fibonacci-weighted frequency distribution over that alphabet can
/// produce a tree of depth 93, i.e. code lengths well past 32 — which is
/// exactly the overflow `write_bits`'s `value >> i` hit. 24 bits leaves
/// wide margin over the theoretical minimum while staying comfortably
/// under the 32-bit limit.
const MAX_CODE_LEN: u8 = 24;

/// One entry of a package-merge coin list: a weight and the set of
/// original symbol indices ("coins") it represents.
#[derive(Clone)]
struct PackageItem {
    weight: u64,
    counts: Vec<u32>,
}

/// Pairs up consecutive items of a weight-sorted list, merging their
/// weights and coin counts. An odd item left at the end is dropped, per
/// the package step of package-merge.
fn package(list: &[PackageItem]) -> Vec<PackageItem> {
    let mut out = Vec::with_capacity(list.len() / 2);
    let mut it = list.chunks_exact(2);
    for pair in &mut it {
        let mut counts = pair[0].counts.clone();
        for (i, c) in pair[1].counts.iter().enumerate() {
            counts[i] += c;
        }
        out.push(PackageItem {
            weight: pair[0].weight + pair[1].weight,
            counts,
        });
    }
    out
}

/// Merges two weight-sorted lists into one weight-sorted list, favoring
/// `a` on ties (matches the usual coin-collector tie-break).
fn merge_sorted(a: &[PackageItem], b: Vec<PackageItem>) -> Vec<PackageItem> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut ai = 0;
    let mut bi = 0;
    while ai < a.len() && bi < b.len() {
        if a[ai].weight <= b[bi].weight {
            out.push(PackageItem {
                weight: a[ai].weight,
                counts: a[ai].counts.clone(),
            });
            ai += 1;
        } else {
            out.push(PackageItem {
                weight: b[bi].weight,
                counts: b[bi].counts.clone(),
            });
            bi += 1;
        }
    }
    out.extend(a[ai..].iter().map(|item| PackageItem {
        weight: item.weight,
        counts: item.counts.clone(),
    }));
    out.extend(b.into_iter().skip(bi));
    out
}

/// Computes length-limited code lengths for `symbols` (already sorted
/// ascending by symbol) via package-merge (Larmore & Hirschberg 1990).
/// Every returned length is in `1..=max_len`, and the lengths satisfy the
/// Kraft inequality by construction — unlike an unbounded Huffman tree,
/// this can never hand back a length `write_bits` can't represent.
fn package_merge_lengths(symbols: &[(u8, u64)], max_len: u8) -> Vec<u8> {
    let n = symbols.len();

    let mut sorted_base: Vec<PackageItem> = symbols
        .iter()
        .enumerate()
        .map(|(i, &(_, freq))| {
            let mut counts = vec![0u32; n];
            counts[i] = 1;
            PackageItem {
                weight: freq,
                counts,
            }
        })
        .collect();
    sorted_base.sort_unstable_by_key(|item| item.weight);

    let mut level_list = sorted_base.clone();
    for _ in 2..=max_len {
        let packaged = package(&level_list);
        level_list = merge_sorted(&sorted_base, packaged);
    }

    let take = (2 * (n - 1)).min(level_list.len());
    let mut total_counts = vec![0u32; n];
    for item in &level_list[..take] {
        for (i, c) in item.counts.iter().enumerate() {
            total_counts[i] += c;
        }
    }

    total_counts
        .into_iter()
        .map(|c| (c as u8).max(1))
        .collect()
}

/// Turns a `(symbol, len)` table keyed purely on code length into the
/// sorted `(symbol, len)` table both encoder and decoder expect, for the
/// degenerate 0/1-symbol cases `package_merge_lengths` doesn't handle.
fn lengths_table_from_frequencies(symbols: &[(u8, u64)]) -> Vec<(u8, u8)> {
    if symbols.len() <= 1 {
        return symbols.iter().map(|&(symbol, _)| (symbol, 1)).collect();
    }

    let lengths = package_merge_lengths(symbols, MAX_CODE_LEN);
    let mut table: Vec<(u8, u8)> = symbols
        .iter()
        .zip(lengths)
        .map(|(&(symbol, _), len)| (symbol, len))
        .collect();
    table.sort_unstable_by_key(|&(symbol, len)| (len, symbol));
    table
}

/// Builds a `(symbol, bit_len)` table for the byte values present in
/// `data`, via length-limited package-merge. Returned in ascending
/// `(len, symbol)` order, the order both encoder and decoder assign
/// canonical codes in.
fn build_code_table(data: &[u8]) -> Vec<(u8, u8)> {
    let mut freqs: HashMap<u8, u64> = HashMap::new();
    for &b in data {
        *freqs.entry(b).or_insert(0) += 1;
    }

    let mut symbols: Vec<(u8, u64)> = freqs.into_iter().collect();
    symbols.sort_unstable_by_key(|&(symbol, _)| symbol);

    lengths_table_from_frequencies(&symbols)
}

/// Assigns canonical Huffman codes to a `(symbol, bit_len)` table,
/// ordered ascending by `(len, symbol)` (the standard canonical-code
/// construction: https://en.wikipedia.org/wiki/Canonical_Huffman_code).
fn assign_canonical_codes(table: &[(u8, u8)]) -> HashMap<u8, (u32, u8)> {
    let mut sorted = table.to_vec();
    sorted.sort_unstable_by_key(|&(symbol, len)| (len, symbol));

    let mut codes = HashMap::new();
    let mut code: u32 = 0;
    let mut prev_len = sorted.first().map_or(0, |&(_, len)| len);

    for &(symbol, len) in &sorted {
        code <<= len - prev_len;
        codes.insert(symbol, (code, len));
        code += 1;
        prev_len = len;
    }

    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{QualFieldDecoder, QualFieldEncoder};

    #[test]
    fn test_round_trip_skewed_distribution() -> io::Result<()> {
        let mut enc = QualEncoder::new();
        enc.set_base_qual(b'!');
        enc.accept(b"IIIIIIIIII")?;
        enc.accept(b"I!I!I!I!I!")?;
        enc.finish()?;

        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = QualDecoder::new();
        dec.start(&mut &payload[..])?;
        assert_eq!(dec.decode(10)?, b"IIIIIIIIII");
        assert_eq!(dec.decode(10)?, b"I!I!I!I!I!");
        Ok(())
    }

    #[test]
    fn test_single_symbol_block_round_trips() -> io::Result<()> {
        let mut enc = QualEncoder::new();
        enc.accept(b"IIII")?;
        enc.finish()?;

        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = QualDecoder::new();
        dec.start(&mut &payload[..])?;
        assert_eq!(dec.decode(4)?, b"IIII");
        Ok(())
    }

    #[test]
    fn test_empty_block_round_trips() -> io::Result<()> {
        let mut enc = QualEncoder::new();
        enc.finish()?;

        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = QualDecoder::new();
        dec.start(&mut &payload[..])?;
        assert_eq!(dec.decode(0)?, Vec::<u8>::new());
        Ok(())
    }

    #[test]
    fn test_full_ascii_quality_range_round_trips() -> io::Result<()> {
        let data: Vec<u8> = (33u8..=126).collect();
        let mut enc = QualEncoder::new();
        enc.accept(&data)?;
        enc.finish()?;

        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = QualDecoder::new();
        dec.start(&mut &payload[..])?;
        assert_eq!(dec.decode(data.len())?, data);
        Ok(())
    }

    /// A near-Fibonacci-weighted frequency distribution across the full
    /// 94-symbol quality alphabet is exactly the shape that forces an
    /// unbounded Huffman tree past a 32-bit code length. Package-merge
    /// must still hand back lengths that fit in a `u32` shift.
    #[test]
    fn test_fibonacci_skewed_frequencies_across_full_alphabet_stay_length_limited() {
        let alphabet: Vec<u8> = (33u8..=126).collect();

        let mut freqs = Vec::with_capacity(alphabet.len());
        let (mut a, mut b) = (1u64, 1u64);
        for _ in 0..alphabet.len() {
            freqs.push(a);
            let next = a.saturating_add(b);
            a = b;
            b = next;
        }

        let symbols: Vec<(u8, u64)> = alphabet.into_iter().zip(freqs).collect();
        let table = lengths_table_from_frequencies(&symbols);

        assert_eq!(table.len(), symbols.len());

        let mut kraft_sum = 0f64;
        for &(_, len) in &table {
            assert!(len >= 1);
            // The hazard this regression guards against: `write_bits`
            // shifts a u32 by `len` bits, which panics/corrupts at 32+.
            assert!(len < 32, "code length {len} would overflow a u32 shift");
            assert!(len <= MAX_CODE_LEN);
            kraft_sum += 2f64.powi(-(i32::from(len)));
        }
        assert!(
            (kraft_sum - 1.0).abs() < 1e-6,
            "kraft sum should be 1.0 for a complete code, got {kraft_sum}"
        );
    }

    #[test]
    fn test_round_trip_fibonacci_skewed_quality_block() -> io::Result<()> {
        let alphabet: Vec<u8> = (33u8..=126).collect();

        let mut data = Vec::new();
        let (mut a, mut b) = (1u64, 1u64);
        for &symbol in &alphabet {
            let repeats = a.min(500) as usize;
            data.extend(std::iter::repeat(symbol).take(repeats));
            let next = a.saturating_add(b);
            a = b;
            b = next;
        }

        let mut enc = QualEncoder::new();
        enc.set_base_qual(b'!');
        enc.accept(&data)?;
        enc.finish()?;

        let mut payload = Vec::new();
        enc.flush(&mut payload)?;

        let mut dec = QualDecoder::new();
        dec.start(&mut &payload[..])?;
        assert_eq!(dec.decode(data.len())?, data);
        Ok(())
    }
}
