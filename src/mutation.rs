use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::sequence::Sequence;
use crate::structure::{Region, RegionKind};
use crate::target::Target;
use crate::Base;

/// One substitution applied by the mutator
#[derive(Debug, Clone, PartialEq)]
pub struct PointMutation {
    pub region: String,
    pub position: usize,
    /// base of the unmutated target
    pub reference: Base,
    pub alternative: Base,
}

/// How many positions of each region get substituted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum MutationPolicy {
    /// `floor(region_length * fraction)` draws per region, with replacement
    Divergence { exon: f64, intron: f64 },
    /// a fixed number of draws per region
    HammingDistance { exon: usize, intron: usize },
}

impl Default for MutationPolicy {
    fn default() -> Self {
        Self::Divergence {
            exon: 0.0,
            intron: 0.5,
        }
    }
}

impl MutationPolicy {
    /// Number of positions to draw inside `region`. Vector regions are never mutated.
    fn draws(&self, region: &Region) -> usize {
        match (self, region.kind) {
            (Self::Divergence { exon, .. }, RegionKind::Exon) => (region.len() as f64 * exon).floor() as usize,
            (Self::Divergence { intron, .. }, RegionKind::Intron) => {
                (region.len() as f64 * intron).floor() as usize
            }
            (Self::HammingDistance { exon, .. }, RegionKind::Exon) => *exon,
            (Self::HammingDistance { intron, .. }, RegionKind::Intron) => *intron,
            (_, RegionKind::Vector) => 0,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        match self {
            Self::Divergence { exon, intron } => {
                for (name, fraction) in &[("exon_divergence", exon), ("intron_divergence", intron)] {
                    if !(0.0..=1.0).contains(*fraction) {
                        return Err(SimulationError::invalid(
                            *name,
                            format!("{} is not within [0, 1]", fraction),
                        ));
                    }
                }
                if *exon <= 0.0 && *intron <= 0.0 {
                    return Err(SimulationError::invalid(
                        "divergence",
                        "exon or intron divergence must be > 0",
                    ));
                }
            }
            Self::HammingDistance { exon, intron } => {
                if *exon == 0 && *intron == 0 {
                    return Err(SimulationError::invalid(
                        "hamming_distance",
                        "exon or intron hamming distance must be > 0",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Applies point substitutions inside annotated regions
#[derive(Debug, Clone, Copy)]
pub struct RegionMutator {
    policy: MutationPolicy,
}

impl RegionMutator {
    pub fn new(policy: MutationPolicy) -> Result<Self, SimulationError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Total number of positions drawn across all regions of `target`
    pub fn budget(&self, target: &Target) -> usize {
        target
            .structure
            .regions()
            .iter()
            .map(|r| self.policy.draws(r))
            .sum()
    }

    /// Mutated copy of `target`
    pub fn mutate<R: Rng + ?Sized>(&self, target: &Target, rng: &mut R) -> Result<Target, SimulationError> {
        self.mutate_recorded(target, rng).map(|(mutant, _)| mutant)
    }

    /// Mutated copy of `target` plus every substitution in the order it was applied
    ///
    /// Positions are drawn with replacement, so one position may be hit more
    /// than once. Each substitution picks one of the three bases that differ
    /// from the unmutated target, so a mutated position never reverts.
    pub fn mutate_recorded<R: Rng + ?Sized>(
        &self,
        target: &Target,
        rng: &mut R,
    ) -> Result<(Target, Vec<PointMutation>), SimulationError> {
        let budget = self.budget(target);
        if budget > target.len() {
            return Err(SimulationError::invalid(
                "hamming_distance",
                format!(
                    "{} substitutions requested for a sequence of length {}",
                    budget,
                    target.len()
                ),
            ));
        }
        if budget == 0 {
            // e.g. only an intron distance was given but the target has no introns
            return Err(SimulationError::invalid(
                "hamming_distance",
                "the mutation policy selects no position of this target",
            ));
        }

        let original = target.sequence.to_bases();
        let mut bases = original.clone();
        let mut mutations = Vec::with_capacity(budget);
        for region in target.structure.regions() {
            for _ in 0..self.policy.draws(region) {
                let position = rng.random_range(region.range.start..=region.range.end);
                // a position hit twice must still differ from the unmutated base
                let reference = original[position];
                let alternative = reference.alternatives()[rng.random_range(0..3)];
                bases[position] = alternative;
                mutations.push(PointMutation {
                    region: region.name.clone(),
                    position,
                    reference,
                    alternative,
                });
            }
        }
        let mutant = target.with_sequence(Sequence::from_bases(bases), true);
        Ok((mutant, mutations))
    }
}
