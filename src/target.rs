use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::error::SimulationError;
use crate::fragment_info::{resolve, FragmentInfo};
use crate::interval::Interval;
use crate::sequence::{Sequence, SequenceGenerator};
use crate::structure::{Structure, StructureAnnotator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Intronless,
    ContainsIntrons,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Intronless => "intronless",
                Self::ContainsIntrons => "contains_introns",
            }
        )
    }
}

/// A hybridization site with its exon/intron annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub sequence: Sequence,
    pub structure: Structure,
    pub kind: TargetKind,
    pub mutated: bool,
}

impl Target {
    pub fn new(sequence: Sequence, structure: Structure) -> Result<Self, SimulationError> {
        if structure.sequence_length() != sequence.len() {
            return Err(SimulationError::LengthMismatch {
                left: sequence.len(),
                right: structure.sequence_length(),
            });
        }
        let kind = if structure.intron_count() == 0 {
            TargetKind::Intronless
        } else {
            TargetKind::ContainsIntrons
        };
        Ok(Self {
            sequence,
            structure,
            kind,
            mutated: false,
        })
    }

    /// Draw a random sequence and annotate it with `intron_count` introns
    pub fn generate<R: Rng + ?Sized>(
        generator: &SequenceGenerator,
        annotator: &StructureAnnotator,
        length: usize,
        gc_content: f64,
        intron_count: usize,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        let sequence = generator.generate(length, gc_content, rng)?;
        let structure = annotator.annotate(sequence.len(), intron_count, rng)?;
        Self::new(sequence, structure)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The opposite strand, read 5' to 3'
    pub fn reverse_complement(&self) -> Sequence {
        self.sequence.reverse_complement()
    }

    /// Region annotation and bases of `[start, end]`
    pub fn fragment(&self, start: usize, end: usize) -> Result<(FragmentInfo, &str), SimulationError> {
        let info = resolve(&self.structure, start, end)?;
        let bases = self.sequence.slice(&Interval::new(start, end)?);
        Ok((info, bases))
    }

    /// Same target with a different sequence, used by the mutator
    pub(crate) fn with_sequence(&self, sequence: Sequence, mutated: bool) -> Self {
        Self {
            sequence,
            structure: self.structure.clone(),
            kind: self.kind,
            mutated,
        }
    }
}
