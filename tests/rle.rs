//! Integration-level run-length faithfulness (spec.md §8 invariant 3: the
//! `readlen`/`qual_scheme` run-length lists never distort the reads they
//! describe, even across runs, repeats, and single-entry transitions).

use std::io::Cursor;

use quip::io::{Reader, Writer};
use quip::Read;

fn read(id: &[u8], len: usize, qual_base: u8) -> Read {
    Read::new(
        id.to_vec(),
        Vec::new(),
        vec![b'A'; len],
        vec![qual_base; len],
    )
    .unwrap()
}

#[test]
fn alternating_read_lengths_survive_round_trip() {
    let mut buf = Vec::new();
    let mut writer = Writer::new(Cursor::new(&mut buf)).unwrap();

    let lengths = [50usize, 51, 50, 51, 50, 50, 50, 51];
    let mut expected = Vec::new();
    for (i, &len) in lengths.iter().enumerate() {
        let id = format!("r{i}").into_bytes();
        let r = read(&id, len, b'I');
        writer.write_read(r.clone()).unwrap();
        expected.push(r);
    }
    writer.close().unwrap();
    drop(writer);

    let mut reader = Reader::new(Cursor::new(&buf)).unwrap();
    let mut decoded = Vec::new();
    while let Some(r) = reader.read_read().unwrap() {
        decoded.push(r);
    }

    assert_eq!(decoded.len(), expected.len());
    for (got, want) in decoded.iter().zip(&expected) {
        assert_eq!(got.read_length(), want.read_length());
    }
    assert_eq!(decoded, expected);
}

#[test]
fn quality_scheme_transitions_across_the_window_survive_round_trip() {
    use quip::io::WriterBuilder;

    let mut buf = Vec::new();
    // A small chunk capacity forces each group of 10 reads below into its
    // own chunk, so each group gets its own min/max scan and scheme
    // decision instead of being folded into one chunk-wide scan.
    let options = WriterBuilder::new().set_chunk_capacity(10).build();
    let mut writer = Writer::with_options(Cursor::new(&mut buf), options).unwrap();

    // A run of low-quality bytes, then a run far enough above them (more
    // than the scheme window width apart) to force a new scheme entry,
    // then back down again.
    let schemes: [u8; 3] = [b'!', b'~', b'#'];
    let mut expected = Vec::new();
    for (chunk_idx, &base) in schemes.iter().enumerate() {
        for i in 0..10 {
            let id = format!("r{chunk_idx}_{i}").into_bytes();
            let r = read(&id, 6, base);
            writer.write_read(r.clone()).unwrap();
            expected.push(r);
        }
    }
    writer.close().unwrap();
    drop(writer);

    let mut reader = Reader::new(Cursor::new(&buf)).unwrap();
    let mut decoded = Vec::new();
    while let Some(r) = reader.read_read().unwrap() {
        decoded.push(r);
    }

    assert_eq!(decoded, expected);
    assert!(reader.warnings().is_empty());
}

#[test]
fn single_read_stream_has_a_single_run_of_length_one() {
    let mut buf = Vec::new();
    let mut writer = Writer::new(Cursor::new(&mut buf)).unwrap();
    let only = read(b"solo", 42, b'5');
    writer.write_read(only.clone()).unwrap();
    writer.close().unwrap();
    drop(writer);

    let mut reader = Reader::new(Cursor::new(&buf)).unwrap();
    let got = reader.read_read().unwrap().unwrap();
    assert_eq!(got, only);
    assert!(reader.read_read().unwrap().is_none());
}
