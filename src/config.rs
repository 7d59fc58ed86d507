//! Run configuration
//!
//! A configuration is read once (from JSON or built in code) and validated
//! before any trial starts. Every section falls back to its defaults, so a
//! JSON file only needs to name the values it changes:
//!
//! ```rust
//! use hybsim::config::SimulationConfig;
//!
//! let config = SimulationConfig::from_json_str(r#"{
//!     "target": { "length": 1500, "intron_count": 3 },
//!     "mutation": { "policy": "hamming_distance", "exon": 5, "intron": 20 },
//!     "trials": 100
//! }"#).unwrap();
//! assert_eq!(config.target.gc_content, 0.32);
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FileError, SimulationError};
use crate::fragmentation::FragmentationEngine;
use crate::mutation::{MutationPolicy, RegionMutator};
use crate::probe::{ProbeBuilder, DEFAULT_MAX_PROBE_ATTEMPTS, DEFAULT_MIN_INSERT_LENGTH, DEFAULT_MIN_VECTOR_LENGTH};
use crate::sequence::{nucleotide_weights, SequenceGenerator, DEFAULT_MIN_TARGET_LENGTH};
use crate::structure::{StructureAnnotator, MAX_ANNOTATION_ATTEMPTS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub length: usize,
    pub gc_content: f64,
    pub intron_count: usize,
    /// shortest target the generator accepts
    pub min_length: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            length: 1100,
            gc_content: 0.32,
            intron_count: 2,
            min_length: DEFAULT_MIN_TARGET_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// length of the target window copied into the probe; the whole target if unset
    pub insert_length: Option<usize>,
    pub vector_length: usize,
    pub vector_gc_content: f64,
    pub min_vector_length: usize,
    pub min_insert_length: usize,
    /// redraw the insert until it carries at least one intron
    pub require_intron: bool,
    pub max_attempts: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            insert_length: None,
            vector_length: 3000,
            vector_gc_content: 0.5,
            min_vector_length: DEFAULT_MIN_VECTOR_LENGTH,
            min_insert_length: DEFAULT_MIN_INSERT_LENGTH,
            require_intron: false,
            max_attempts: DEFAULT_MAX_PROBE_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentationConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self {
            min_length: 100,
            max_length: 1100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub target: TargetConfig,
    pub mutation: MutationPolicy,
    /// size of the mutant pool in the specificity experiment
    pub mutated_targets: usize,
    pub probe: ProbeConfig,
    pub fragmentation: FragmentationConfig,
    pub complementarity_threshold: f64,
    pub trials: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            mutation: MutationPolicy::default(),
            mutated_targets: 1,
            probe: ProbeConfig::default(),
            fragmentation: FragmentationConfig::default(),
            complementarity_threshold: 0.8,
            trials: 10,
            seed: 5671,
        }
    }
}

impl SimulationConfig {
    /// Defaults for the specificity experiment: an intron-spanning 1 kb probe
    /// cut into 200-600 bp pieces and tested against a mutant pool
    pub fn specificity() -> Self {
        Self {
            target: TargetConfig {
                length: 2000,
                intron_count: 3,
                ..TargetConfig::default()
            },
            mutation: MutationPolicy::HammingDistance { exon: 5, intron: 20 },
            probe: ProbeConfig {
                insert_length: Some(1000),
                vector_length: 1000,
                require_intron: true,
                ..ProbeConfig::default()
            },
            fragmentation: FragmentationConfig {
                min_length: 200,
                max_length: 600,
            },
            trials: 100_000,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply `json` on top of `base`: keys the JSON names replace those of
    /// `base`, everything else is kept
    pub fn from_json_str_over(base: &SimulationConfig, json: &str) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(base)?;
        merge_json(&mut merged, serde_json::from_str(json)?);
        serde_json::from_value(merged)
    }

    pub fn from_json_file_over<P: AsRef<Path>>(base: &SimulationConfig, path: P) -> Result<Self, FileError> {
        let text = std::fs::read_to_string(&path).map_err(|e| FileError::io(Some(&path), e))?;
        Self::from_json_str_over(base, &text).map_err(|e| FileError::json(Some(&path), e))
    }

    pub fn insert_length(&self) -> usize {
        self.probe.insert_length.unwrap_or(self.target.length)
    }

    pub fn probe_length(&self) -> usize {
        self.insert_length() + self.probe.vector_length
    }

    /// Check every parameter range
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.target.length < self.target.min_length.max(1) {
            return Err(SimulationError::invalid(
                "target_length",
                format!("{} is below the minimum of {}", self.target.length, self.target.min_length.max(1)),
            ));
        }
        nucleotide_weights(self.target.gc_content)?;
        nucleotide_weights(self.probe.vector_gc_content)
            .map_err(|_| SimulationError::invalid("vector_gc_content", "must be within [0, 1]"))?;
        if !(0.0..=1.0).contains(&self.complementarity_threshold) {
            return Err(SimulationError::invalid(
                "complementarity_threshold",
                format!("{} is not within [0, 1]", self.complementarity_threshold),
            ));
        }
        if self.trials == 0 {
            return Err(SimulationError::invalid("trials", "must be > 0"));
        }
        if self.mutated_targets == 0 {
            return Err(SimulationError::invalid("mutated_targets", "must be > 0"));
        }
        self.mutation.validate()?;
        if self.probe.vector_length < self.probe.min_vector_length {
            return Err(SimulationError::invalid(
                "vector_length",
                format!(
                    "{} is below the minimum of {}",
                    self.probe.vector_length, self.probe.min_vector_length
                ),
            ));
        }
        let insert_length = self.insert_length();
        if insert_length > self.target.length || insert_length < self.probe.min_insert_length.max(1) {
            return Err(SimulationError::invalid(
                "insert_length",
                format!(
                    "{} is not within [{}, {}]",
                    insert_length,
                    self.probe.min_insert_length.max(1),
                    self.target.length
                ),
            ));
        }
        if self.probe.require_intron && self.target.intron_count == 0 {
            return Err(SimulationError::invalid(
                "intron_count",
                "an intron-spanning probe needs a target with introns",
            ));
        }
        let engine = self.fragmentation_engine()?;
        if engine.max_length() > self.probe_length() {
            return Err(SimulationError::invalid(
                "fragment_max_length",
                format!("{} exceeds the probe length {}", engine.max_length(), self.probe_length()),
            ));
        }
        Ok(())
    }

    pub fn sequence_generator(&self) -> SequenceGenerator {
        SequenceGenerator::new(self.target.min_length)
    }

    pub fn annotator(&self) -> StructureAnnotator {
        StructureAnnotator::new(MAX_ANNOTATION_ATTEMPTS)
    }

    pub fn mutator(&self) -> Result<RegionMutator, SimulationError> {
        RegionMutator::new(self.mutation)
    }

    pub fn probe_builder(&self) -> ProbeBuilder {
        ProbeBuilder::new(self.probe.vector_length, self.probe.vector_gc_content)
            .min_vector_length(self.probe.min_vector_length)
            .min_insert_length(self.probe.min_insert_length)
            .max_attempts(self.probe.max_attempts)
    }

    pub fn fragmentation_engine(&self) -> Result<FragmentationEngine, SimulationError> {
        FragmentationEngine::new(self.fragmentation.min_length, self.fragmentation.max_length)
    }
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    // a tagged mutation policy is replaced as a whole
                    Some(slot) if value.get("policy").is_none() => merge_json(slot, value),
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.insert_length(), 1100);
        assert_eq!(config.probe_length(), 4100);
        assert!(SimulationConfig::specificity().validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = SimulationConfig::from_json_str(
            r#"{"complementarity_threshold": 0.5, "probe": {"insert_length": 800}}"#,
        )
        .unwrap();
        assert_eq!(config.complementarity_threshold, 0.5);
        assert_eq!(config.insert_length(), 800);
        assert_eq!(config.probe.vector_length, 3000);
        assert_eq!(config.target, TargetConfig::default());
    }

    #[test]
    fn test_json_layers_over_base() {
        let base = SimulationConfig::specificity();
        let config = SimulationConfig::from_json_str_over(
            &base,
            r#"{"trials": 500, "fragmentation": {"max_length": 400}, "probe": {"vector_length": 800}}"#,
        )
        .unwrap();
        assert_eq!(config.trials, 500);
        assert_eq!(config.fragmentation.max_length, 400);
        assert_eq!(config.fragmentation.min_length, 200);
        assert_eq!(config.probe.vector_length, 800);
        assert!(config.probe.require_intron);
        assert_eq!(config.insert_length(), 1000);
        assert_eq!(config.mutation, base.mutation);
        assert_eq!(config.target, base.target);

        let replaced = SimulationConfig::from_json_str_over(
            &base,
            r#"{"mutation": {"policy": "divergence", "exon": 0.1, "intron": 0.4}}"#,
        )
        .unwrap();
        assert_eq!(replaced.mutation, MutationPolicy::Divergence { exon: 0.1, intron: 0.4 });
        assert_eq!(SimulationConfig::from_json_str_over(&base, "{}").unwrap(), base);
    }

    #[test]
    fn test_json_file_over_base() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"seed": 42}}"#).unwrap();
        file.flush().unwrap();
        let config = SimulationConfig::from_json_file_over(&SimulationConfig::specificity(), file.path()).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.trials, 100_000);
        assert!(SimulationConfig::from_json_file_over(&SimulationConfig::default(), "/no/such/config.json").is_err());
    }

    #[test]
    fn test_mutation_policy_json() {
        let config = SimulationConfig::from_json_str(
            r#"{"mutation": {"policy": "divergence", "exon": 0.1, "intron": 0.6}}"#,
        )
        .unwrap();
        assert_eq!(config.mutation, MutationPolicy::Divergence { exon: 0.1, intron: 0.6 });
        assert!(SimulationConfig::from_json_str(r#"{"mutation": {"policy": "lots"}}"#).is_err());
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = SimulationConfig::default();
        config.complementarity_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.target.gc_content = -0.2;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.target.length = 500;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.probe.insert_length = Some(2000);
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.fragmentation.max_length = 5000;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.trials = 0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.target.intron_count = 0;
        config.probe.require_intron = true;
        assert!(config.validate().is_err());
    }
}
