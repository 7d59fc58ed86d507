use crate::error::SimulationError;
use crate::Base;

/// Replace every base by its Watson-Crick partner. Gap markers are kept as-is.
pub fn complement(seq: &str) -> String {
    seq.chars().map(complement_char).collect()
}

pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement_char).collect()
}

fn complement_char(c: char) -> char {
    match Base::from(c) {
        Base::N => c,
        base => base.complement().name(),
    }
}

fn is_complementary_pair(a: u8, b: u8) -> bool {
    matches!(
        (a, b),
        (b'A', b'T') | (b'T', b'A') | (b'G', b'C') | (b'C', b'G')
    )
}

/// Fraction of positions where `seq_a` and `seq_b` form a canonical
/// Watson-Crick pair (A-T, T-A, G-C, C-G)
///
/// Anything else, including gap markers, counts as unpaired.
pub fn score(seq_a: &str, seq_b: &str) -> Result<f64, SimulationError> {
    if seq_a.len() != seq_b.len() {
        return Err(SimulationError::LengthMismatch {
            left: seq_a.len(),
            right: seq_b.len(),
        });
    }
    if seq_a.is_empty() {
        return Err(SimulationError::invalid(
            "sequence",
            "cannot score empty sequences",
        ));
    }
    let paired = seq_a
        .bytes()
        .zip(seq_b.bytes())
        .filter(|(a, b)| is_complementary_pair(*a, *b))
        .count();
    Ok(paired as f64 / seq_a.len() as f64)
}
