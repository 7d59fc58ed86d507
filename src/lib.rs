pub mod classifier;
mod complementarity;
pub mod config;
pub mod error;
mod fragment_info;
mod fragmentation;
pub mod interval;
pub mod log_writer;
mod mutation;
mod probe;
mod seq_window_slider;
mod sequence;
pub mod simulation;
mod structure;
pub mod sweep;
mod tally;
mod target;

use std::convert::TryFrom;
use std::fmt;

use serde_repr::{Deserialize_repr, Serialize_repr};

pub use crate::classifier::{SpecificityOutcome, SpecificityTrial};
pub use crate::complementarity::{complement, reverse_complement, score};
pub use crate::config::SimulationConfig;
use crate::error::ParseError;
pub use crate::error::{HybsimError, SimulationError};
pub use crate::fragment_info::{resolve, FragmentInfo};
pub use crate::fragmentation::{Block, BlockKind, Fragment, FragmentationEngine, ReconstructedRead};
pub use crate::interval::Interval;
pub use crate::mutation::{MutationPolicy, PointMutation, RegionMutator};
pub use crate::probe::{Probe, ProbeBuilder};
pub use crate::sequence::{Sequence, SequenceGenerator};
pub use crate::simulation::{HybridizationReport, RepeatedReport, SimulationDriver, SpecificityReport};
pub use crate::structure::{Region, RegionKind, Structure, StructureAnnotator};
pub use crate::tally::{Label, LabelSummary, Tally};
pub use crate::target::{Target, TargetKind};

/// Result label of one trial of the four-way hybridization experiment
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Outcome {
    RealOnly = 0,
    MutantOnly = 1,
    Neither = 2,
    Both = 3,
}

impl Outcome {
    /// Classify a trial from the hybridization state of the real and the mutated target
    pub fn from_hybridization(real: bool, mutant: bool) -> Self {
        match (real, mutant) {
            (true, false) => Self::RealOnly,
            (false, true) => Self::MutantOnly,
            (false, false) => Self::Neither,
            (true, true) => Self::Both,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealOnly => "real_only",
            Self::MutantOnly => "mutant_only",
            Self::Neither => "neither",
            Self::Both => "both",
        }
    }

    pub fn iter() -> OutcomeIter {
        OutcomeIter { index: 0 }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let string = match self {
            Self::RealOnly => "REAL_ONLY",
            Self::MutantOnly => "MUTANT_ONLY",
            Self::Neither => "NEITHER",
            Self::Both => "BOTH",
        };
        write!(f, "{}", string)
    }
}

impl TryFrom<&str> for Outcome {
    type Error = ParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(match s.to_lowercase().as_str() {
            "real_only" | "realonly" | "r" => Self::RealOnly,
            "mutant_only" | "mutantonly" | "m" => Self::MutantOnly,
            "neither" | "n" => Self::Neither,
            "both" | "b" => Self::Both,
            _ => return Err(ParseError::somewhere("name of outcome", s.to_string())),
        })
    }
}

impl TryFrom<u8> for Outcome {
    type Error = ParseError;
    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            0 => Ok(Self::RealOnly),
            1 => Ok(Self::MutantOnly),
            2 => Ok(Self::Neither),
            3 => Ok(Self::Both),
            _ => Err(ParseError::somewhere("outcome code 0-3", n.to_string())),
        }
    }
}

pub struct OutcomeIter {
    index: u8,
}

impl std::iter::Iterator for OutcomeIter {
    type Item = Outcome;

    fn next(&mut self) -> Option<Self::Item> {
        let result = Outcome::try_from(self.index).ok();
        if result.is_some() {
            self.index += 1;
        }
        result
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Base {
    A,
    C,
    G,
    T,
    N,
}

impl Base {
    pub fn name(&self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
            Base::N => 'N',
        }
    }

    /// Watson-Crick partner. Gaps stay gaps.
    pub fn complement(&self) -> Base {
        match self {
            Base::A => Base::T,
            Base::T => Base::A,
            Base::G => Base::C,
            Base::C => Base::G,
            Base::N => Base::N,
        }
    }

    /// The three nucleotides that differ from this one
    pub fn alternatives(&self) -> [Base; 3] {
        match self {
            Base::A => [Base::T, Base::G, Base::C],
            Base::T => [Base::A, Base::G, Base::C],
            Base::G => [Base::A, Base::T, Base::C],
            Base::C => [Base::A, Base::T, Base::G],
            Base::N => [Base::A, Base::T, Base::G], // any substitution replaces a gap
        }
    }
}

/// Anything outside the nucleotide alphabet is treated as a gap
impl From<char> for Base {
    fn from(c: char) -> Self {
        match c {
            'A' | 'a' => Self::A,
            'C' | 'c' => Self::C,
            'G' | 'g' => Self::G,
            'T' | 't' => Self::T,
            _ => Self::N,
        }
    }
}
