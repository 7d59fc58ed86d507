use std::convert::TryFrom;
use std::fmt;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use crate::error::{ParseError, SimulationError};
use crate::interval::Interval;
use crate::Base;

/// Targets shorter than this are rejected unless the floor is lowered explicitly
pub const DEFAULT_MIN_TARGET_LENGTH: usize = 700;

/// Sampling order of the nucleotide alphabet
pub const ALPHABET: [Base; 4] = [Base::A, Base::T, Base::G, Base::C];

/// An immutable nucleotide sequence over {A,T,G,C}
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    bases: String,
}

impl Sequence {
    pub fn as_str(&self) -> &str {
        &self.bases
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bases.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// The bases inside an inclusive interval
    pub fn slice(&self, range: &Interval) -> &str {
        &self.bases[range.start..=range.end]
    }

    pub fn sub_sequence(&self, range: &Interval) -> Sequence {
        Sequence {
            bases: self.slice(range).to_string(),
        }
    }

    pub fn complement(&self) -> Sequence {
        Sequence {
            bases: crate::complementarity::complement(&self.bases),
        }
    }

    pub fn reverse_complement(&self) -> Sequence {
        Sequence {
            bases: crate::complementarity::reverse_complement(&self.bases),
        }
    }

    /// Concatenate two sequences into a new one
    pub fn join(&self, other: &Sequence) -> Sequence {
        let mut bases = String::with_capacity(self.len() + other.len());
        bases.push_str(&self.bases);
        bases.push_str(&other.bases);
        Sequence { bases }
    }

    /// Fraction of G and C symbols
    pub fn gc_content(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let gc = self
            .bases
            .bytes()
            .filter(|b| *b == b'G' || *b == b'C')
            .count();
        gc as f64 / self.len() as f64
    }

    pub(crate) fn from_bases(bases: Vec<Base>) -> Sequence {
        Sequence {
            bases: bases.iter().map(|b| b.name()).collect(),
        }
    }

    pub(crate) fn to_bases(&self) -> Vec<Base> {
        self.bases.chars().map(Base::from).collect()
    }
}

impl TryFrom<&str> for Sequence {
    type Error = ParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if let Some(bad) = s.chars().find(|c| !matches!(c, 'A' | 'T' | 'G' | 'C')) {
            return Err(ParseError::somewhere("one of A,T,G,C", bad.to_string()));
        }
        Ok(Sequence {
            bases: s.to_string(),
        })
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bases)
    }
}

/// Draws random sequences with a given GC-content
#[derive(Debug, Clone, Copy)]
pub struct SequenceGenerator {
    min_length: usize,
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TARGET_LENGTH)
    }
}

impl SequenceGenerator {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Draw `length` independent bases. G and C are each drawn with
    /// probability `gc_content/2`, A and T with `(1-gc_content)/2`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        length: usize,
        gc_content: f64,
        rng: &mut R,
    ) -> Result<Sequence, SimulationError> {
        if length < self.min_length.max(1) {
            return Err(SimulationError::invalid(
                "length",
                format!("{} is below the minimum of {}", length, self.min_length.max(1)),
            ));
        }
        let distribution = WeightedIndex::new(nucleotide_weights(gc_content)?)
            .map_err(|e| SimulationError::invalid("gc_content", e.to_string()))?;
        let bases = (0..length)
            .map(|_| ALPHABET[distribution.sample(rng)])
            .collect();
        Ok(Sequence::from_bases(bases))
    }
}

/// Sampling weights for A, T, G and C (in `ALPHABET` order)
pub fn nucleotide_weights(gc_content: f64) -> Result<[f64; 4], SimulationError> {
    if !(0.0..=1.0).contains(&gc_content) {
        return Err(SimulationError::invalid(
            "gc_content",
            format!("{} is not within [0, 1]", gc_content),
        ));
    }
    let at = (1.0 - gc_content) / 2.0;
    let gc = gc_content / 2.0;
    Ok([at, at, gc, gc])
}
