//! Non-fatal diagnostics (§7 "`CrcMismatch`: ... non-fatal").
//!
//! This crate carries no logging dependency (the teacher carries none
//! either); instead a reader accumulates [`Warning`]s as it decodes and
//! exposes them for the caller to inspect or print, the same role a log
//! line would play, without committing the crate to a particular logging
//! facade.

use std::fmt;

/// One non-fatal condition observed while decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Warning {
    /// A field's observed CRC64 did not match the one recorded in the
    /// block header.
    CrcMismatch {
        /// Zero-based index of the block the mismatch was observed in.
        block: u64,
        /// Which of the four fields mismatched.
        field: Field,
    },
}

/// One of the four per-read fields a block carries a CRC64 for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    /// The read identifier field.
    Id,
    /// The auxiliary tag block field.
    Aux,
    /// The nucleotide sequence field.
    Seq,
    /// The per-base quality score field.
    Qual,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Id => "id",
            Field::Aux => "aux",
            Field::Seq => "seq",
            Field::Qual => "qual",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CrcMismatch { block, field } => {
                write!(f, "CRC64 mismatch (block={block}, field={field})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_labelled_format() {
        let warning = Warning::CrcMismatch {
            block: 2,
            field: Field::Qual,
        };
        assert_eq!(warning.to_string(), "CRC64 mismatch (block=2, field=qual)");
    }
}
