//! Per-trial hybridization decisions
//!
//! Two independent policies live here. The four-way policy overlays a
//! reconstructed read on the real and on the mutated target and reports
//! which of them hybridized (see `Outcome`). The specificity policy tests a
//! single probe fragment against a pool of real and mutated targets in both
//! orientations and labels the trial as a true negative or a false positive.

use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use crate::complementarity::{complement, score};
use crate::error::SimulationError;
use crate::fragmentation::{FragmentationEngine, ReconstructedRead};
use crate::probe::Probe;
use crate::sequence::Sequence;
use crate::target::Target;
use crate::Outcome;

fn check_threshold(threshold: f64) -> Result<(), SimulationError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SimulationError::invalid(
            "complementarity_threshold",
            format!("{} is not within [0, 1]", threshold),
        ));
    }
    Ok(())
}

/// Four-way classification of real vs. mutated target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridizationClassifier {
    threshold: f64,
}

impl HybridizationClassifier {
    pub fn new(threshold: f64) -> Result<Self, SimulationError> {
        check_threshold(threshold)?;
        Ok(Self { threshold })
    }

    /// `true` if any probe block pairs with its window of `target` at least
    /// as well as the threshold demands
    ///
    /// Blocks without a single paired base never count, so a threshold of 0
    /// still requires some overlap.
    pub fn hybridizes(&self, read: &ReconstructedRead, target: &Sequence) -> Result<bool, SimulationError> {
        if read.len() != target.len() {
            return Err(SimulationError::LengthMismatch {
                left: read.len(),
                right: target.len(),
            });
        }
        for block in read.probe_blocks() {
            let complement = block.complement().unwrap_or_default();
            let complementarity = score(complement, target.slice(&block.range))?;
            if complementarity > 0.0 && complementarity >= self.threshold {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn classify(
        &self,
        real_read: &ReconstructedRead,
        real: &Target,
        mutant_read: &ReconstructedRead,
        mutant: &Target,
    ) -> Result<Outcome, SimulationError> {
        let real_hybridized = self.hybridizes(real_read, &real.sequence)?;
        let mutant_hybridized = self.hybridizes(mutant_read, &mutant.sequence)?;
        Ok(Outcome::from_hybridization(real_hybridized, mutant_hybridized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecificityOutcome {
    TrueNegative,
    FalsePositive,
    /// counted toward neither specificity term
    Unclassified,
}

impl SpecificityOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrueNegative => "true_negative",
            Self::FalsePositive => "false_positive",
            Self::Unclassified => "unclassified",
        }
    }

    pub fn iter() -> impl Iterator<Item = SpecificityOutcome> {
        vec![Self::TrueNegative, Self::FalsePositive, Self::Unclassified].into_iter()
    }
}

impl fmt::Display for SpecificityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// One target of the specificity pool, stored in both orientations
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub name: String,
    pub real: bool,
    pub strands: [Sequence; 2],
}

/// The real target (`rt`) followed by its mutated copies (`mt1`, `mt2`, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPool {
    entries: Vec<PoolEntry>,
}

impl TargetPool {
    pub fn new(real: &Target, mutants: &[Target]) -> Self {
        let mut entries = Vec::with_capacity(mutants.len() + 1);
        entries.push(PoolEntry {
            name: "rt".to_string(),
            real: true,
            strands: [real.sequence.clone(), real.reverse_complement()],
        });
        for (i, mutant) in mutants.iter().enumerate() {
            entries.push(PoolEntry {
                name: format!("mt{}", i + 1),
                real: false,
                strands: [mutant.sequence.clone(), mutant.reverse_complement()],
            });
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    /// Length of the shortest pooled target
    pub fn min_length(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.strands[0].len())
            .min()
            .unwrap_or(0)
    }
}

/// The random draws and measurements of one specificity trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecificityTrial {
    pub target_name: String,
    pub real_target: bool,
    pub reverse_strand: bool,
    pub reversed_fragment: bool,
    pub fragment_length: usize,
    pub insert_fraction: f64,
    pub vector_fraction: f64,
    /// fraction of fragment positions identical to the target window
    pub similarity: f64,
}

impl SpecificityTrial {
    /// Cut a fragment from `probe`, optionally reverse it, and lay it on a
    /// random window of a random strand of a random pool target
    pub fn draw<R: Rng + ?Sized>(
        probe: &Probe,
        pool: &TargetPool,
        engine: &FragmentationEngine,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        let fragment = engine.sample_fragment(probe, rng)?;
        let (insert_fraction, vector_fraction) = fragment.info(probe)?.proportions();
        let reversed_fragment = rng.random_bool(0.5);
        let bases: String = if reversed_fragment {
            fragment.sequence.chars().rev().collect()
        } else {
            fragment.sequence.clone()
        };

        let entry = pool
            .entries()
            .choose(rng)
            .ok_or_else(|| SimulationError::invalid("target_pool", "pool is empty"))?;
        let reverse_strand = rng.random_bool(0.5);
        let strand = &entry.strands[usize::from(reverse_strand)];
        if bases.len() > strand.len() {
            return Err(SimulationError::invalid(
                "fragment_max_length",
                format!("fragment of {} bp exceeds target of {} bp", bases.len(), strand.len()),
            ));
        }
        let window_start = rng.random_range(0..=strand.len() - bases.len());
        let window = &strand.as_str()[window_start..window_start + bases.len()];
        let similarity = score(&complement(&bases), window)?;

        Ok(Self {
            target_name: entry.name.clone(),
            real_target: entry.real,
            reverse_strand,
            reversed_fragment,
            fragment_length: bases.len(),
            insert_fraction,
            vector_fraction,
            similarity,
        })
    }
}

/// Labels specificity trials from their similarity and insert/vector make-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecificityClassifier {
    threshold: f64,
}

impl SpecificityClassifier {
    pub fn new(threshold: f64) -> Result<Self, SimulationError> {
        check_threshold(threshold)?;
        Ok(Self { threshold })
    }

    /// A non-matching fragment is a true negative if it is mostly vector and
    /// was laid on the real target, or mostly insert and was laid on a
    /// mutant. A mostly-insert fragment that misses the real target is a
    /// false positive.
    pub fn classify(&self, trial: &SpecificityTrial) -> SpecificityOutcome {
        let thr = self.threshold;
        if trial.similarity >= thr {
            return SpecificityOutcome::Unclassified;
        }
        if (trial.real_target && trial.vector_fraction >= thr)
            || (!trial.real_target && trial.insert_fraction >= thr)
        {
            SpecificityOutcome::TrueNegative
        } else if trial.real_target && trial.insert_fraction >= thr {
            SpecificityOutcome::FalsePositive
        } else {
            SpecificityOutcome::Unclassified
        }
    }
}
